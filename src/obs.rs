//! Optional observability helpers for client operations.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `sweetshop_client.op` with the `op` and
//!   `stage` (call site) fields, plus debug/warn events for every refresh episode transition.
//! - Enable `metrics` to increment the `sweetshop_client_op_total` counter for every
//!   attempt/success/failure, labeled by `op` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Client operations observed by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpKind {
	/// Authenticated resource request (including its single replay).
	Request,
	/// Token refresh episode.
	Refresh,
	/// Credential login.
	Login,
	/// Account registration.
	Register,
}
impl OpKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpKind::Request => "request",
			OpKind::Refresh => "refresh",
			OpKind::Login => "login",
			OpKind::Register => "register",
		}
	}
}
impl Display for OpKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpOutcome {
	/// Entry to a client operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl OpOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpOutcome::Attempt => "attempt",
			OpOutcome::Success => "success",
			OpOutcome::Failure => "failure",
		}
	}
}
impl Display for OpOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Refresh episode transitions reported through [`record_refresh_event`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RefreshEvent {
	/// This request started a new episode.
	Started,
	/// This request joined an episode already in flight.
	Joined,
	/// The stored token had already been rotated; the request replays without a new episode.
	AlreadyRotated,
	/// The episode stored a new access token.
	Succeeded,
	/// The episode failed and the session was cleared.
	Failed,
	/// The episode failed and clearing the session failed too.
	TeardownFailed,
}
impl RefreshEvent {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			RefreshEvent::Started => "started",
			RefreshEvent::Joined => "joined",
			RefreshEvent::AlreadyRotated => "already_rotated",
			RefreshEvent::Succeeded => "succeeded",
			RefreshEvent::Failed => "failed",
			RefreshEvent::TeardownFailed => "teardown_failed",
		}
	}
}
impl Display for RefreshEvent {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

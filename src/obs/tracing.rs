// self
use crate::{
	_prelude::*,
	obs::{OpKind, RefreshEvent},
};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedOp<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedOp<F> = F;

/// A span builder used by client operations.
#[derive(Clone, Debug)]
pub struct OpSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl OpSpan {
	/// Creates a new span tagged with the provided operation kind + stage.
	pub fn new(kind: OpKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("sweetshop_client.op", op = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedOp<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits a structured event for a refresh episode transition (when tracing is enabled).
///
/// Failures log at `warn`, everything else at `debug`.
pub fn record_refresh_event(event: RefreshEvent, episode: u64) {
	#[cfg(feature = "tracing")]
	{
		match event {
			RefreshEvent::Failed =>
				tracing::warn!(episode, event = event.as_str(), "token refresh episode failed"),
			RefreshEvent::TeardownFailed => tracing::warn!(
				episode,
				event = event.as_str(),
				"session could not be cleared after a failed refresh"
			),
			_ => tracing::debug!(episode, event = event.as_str(), "token refresh episode"),
		}
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (event, episode);
	}
}

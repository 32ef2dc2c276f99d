// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for refresh episodes and replays.
#[derive(Debug, Default)]
pub struct RefreshMetrics {
	episodes: AtomicU64,
	waiters: AtomicU64,
	reused: AtomicU64,
	success: AtomicU64,
	failure: AtomicU64,
	teardown_failure: AtomicU64,
	replays: AtomicU64,
}
impl RefreshMetrics {
	/// Returns the number of refresh calls issued (one per episode).
	pub fn episodes(&self) -> u64 {
		self.episodes.load(Ordering::Relaxed)
	}

	/// Returns the number of requests that joined an episode already in flight.
	pub fn waiters(&self) -> u64 {
		self.waiters.load(Ordering::Relaxed)
	}

	/// Returns the number of requests that replayed with an already rotated token.
	pub fn reused(&self) -> u64 {
		self.reused.load(Ordering::Relaxed)
	}

	/// Returns the number of episodes that stored a new access token.
	pub fn successes(&self) -> u64 {
		self.success.load(Ordering::Relaxed)
	}

	/// Returns the number of episodes that failed and cleared the session.
	pub fn failures(&self) -> u64 {
		self.failure.load(Ordering::Relaxed)
	}

	/// Returns the number of failed episodes whose session teardown also failed.
	pub fn teardown_failures(&self) -> u64 {
		self.teardown_failure.load(Ordering::Relaxed)
	}

	/// Returns the number of requests replayed after recovery.
	pub fn replays(&self) -> u64 {
		self.replays.load(Ordering::Relaxed)
	}

	pub(crate) fn record_episode(&self) {
		self.episodes.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_waiter(&self) {
		self.waiters.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_reuse(&self) {
		self.reused.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_success(&self) {
		self.success.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failure.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_teardown_failure(&self) {
		self.teardown_failure.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_replay(&self) {
		self.replays.fetch_add(1, Ordering::Relaxed);
	}
}

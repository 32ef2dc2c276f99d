//! Refresh episodes: one shared refresh call per burst of authorization failures.
//!
//! The coordinator is either idle or holds the in-flight episode as a shared future. The first
//! failing request starts the episode; every other failure observed before it settles clones the
//! same future and awaits it, so the whole burst is resolved by exactly one refresh call. The
//! episode resets the coordinator to idle itself, on success and on failure, before any awaiting
//! request observes the outcome. Because any holder can drive a shared future, waiters still see
//! the outcome when the request that started the episode is dropped mid-flight.

// std
use std::sync::atomic::{AtomicU64, Ordering};
// crates.io
use futures_util::future::{BoxFuture, FutureExt, Shared};
// self
use crate::{
	_prelude::*,
	auth::{TokenSecret, TokenUpdate},
	client::{ApiClient, RefreshMetrics},
	error::{ConfigError, RefreshError, detail_from_body},
	http::{HttpRequest, HttpTransport, Method},
	obs::{self, OpKind, OpOutcome, OpSpan, RefreshEvent},
	session::SessionStore,
};

type RefreshOutcome = Result<TokenSecret, RefreshError>;
type SharedRefresh = Shared<BoxFuture<'static, RefreshOutcome>>;

struct Episode {
	id: u64,
	outcome: SharedRefresh,
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
	refresh: &'a str,
}

/// Per-client refresh state: idle (`None`) or the in-flight episode.
#[derive(Clone, Default)]
pub(crate) struct RefreshCoordinator {
	in_flight: Arc<Mutex<Option<Episode>>>,
	episodes: Arc<AtomicU64>,
}
impl RefreshCoordinator {
	pub(crate) fn in_flight(&self) -> bool {
		self.in_flight.lock().is_some()
	}

	/// Resolves an authorization failure for a request that was sent with `rejected`.
	///
	/// When no episode is in flight and the stored access token already differs from the
	/// rejected one, an earlier episode has rotated it and the stored token is returned without
	/// another refresh call.
	pub(crate) async fn recover<T>(
		&self,
		client: &ApiClient<T>,
		rejected: Option<&TokenSecret>,
	) -> RefreshOutcome
	where
		T: ?Sized + HttpTransport,
	{
		let stored = client.session.access_token().await.map_err(failed)?;
		let outcome = {
			let mut slot = self.in_flight.lock();

			if let Some(episode) = slot.as_ref() {
				self.join(client, episode)
			} else if let Some(current) = stored.filter(|current| rejected != Some(current)) {
				client.refresh_metrics.record_reuse();
				obs::record_refresh_event(RefreshEvent::AlreadyRotated, self.current_id());

				return Ok(current);
			} else {
				self.start(client, &mut slot)
			}
		};

		outcome.await
	}

	/// Joins the in-flight episode or starts a new one.
	pub(crate) async fn join_or_start<T>(&self, client: &ApiClient<T>) -> RefreshOutcome
	where
		T: ?Sized + HttpTransport,
	{
		let outcome = {
			let mut slot = self.in_flight.lock();

			if let Some(episode) = slot.as_ref() {
				self.join(client, episode)
			} else {
				self.start(client, &mut slot)
			}
		};

		outcome.await
	}

	fn current_id(&self) -> u64 {
		self.episodes.load(Ordering::Relaxed)
	}

	fn join<T>(&self, client: &ApiClient<T>, episode: &Episode) -> SharedRefresh
	where
		T: ?Sized + HttpTransport,
	{
		client.refresh_metrics.record_waiter();
		obs::record_refresh_event(RefreshEvent::Joined, episode.id);

		episode.outcome.clone()
	}

	/// Creates the episode future and installs it in the (locked) idle slot.
	fn start<T>(&self, client: &ApiClient<T>, slot: &mut Option<Episode>) -> SharedRefresh
	where
		T: ?Sized + HttpTransport,
	{
		let id = self.episodes.fetch_add(1, Ordering::Relaxed) + 1;
		let in_flight = self.in_flight.clone();
		let transport = client.transport.clone();
		let session = client.session.clone();
		let metrics = client.refresh_metrics.clone();
		let refresh_url = client.config.refresh_url.clone();
		let unauthorized_status = client.config.unauthorized_status;
		let span = OpSpan::new(OpKind::Refresh, "refresh_episode");

		metrics.record_episode();
		obs::record_op_outcome(OpKind::Refresh, OpOutcome::Attempt);
		obs::record_refresh_event(RefreshEvent::Started, id);

		let episode = async move {
			let exchanged = span
				.instrument(exchange(
					&*transport,
					&*session,
					refresh_url,
					unauthorized_status,
				))
				.await;
			let outcome = settle(exchanged, session.as_ref(), &metrics, id).await;

			reset(&in_flight, id);

			outcome
		}
		.boxed()
		.shared();

		*slot = Some(Episode { id, outcome: episode.clone() });

		episode
	}
}
impl Debug for RefreshCoordinator {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RefreshCoordinator")
			.field("in_flight", &self.in_flight())
			.field("episodes", &self.current_id())
			.finish()
	}
}

/// Performs the refresh call, bypassing the client's own recovery path, and stores the result.
async fn exchange<T>(
	transport: &T,
	session: &dyn SessionStore,
	refresh_url: Url,
	unauthorized_status: u16,
) -> RefreshOutcome
where
	T: ?Sized + HttpTransport,
{
	let refresh = session.refresh_token().await.map_err(failed)?.ok_or(RefreshError::Unavailable)?;
	let body = serde_json::to_vec(&RefreshRequest { refresh: refresh.expose() })
		.map_err(|e| failed(ConfigError::from(e)))?;
	let label = refresh_url.path().to_owned();
	let request = HttpRequest::new(Method::Post, refresh_url)
		.with_header("accept", "application/json")
		.with_header("content-type", "application/json")
		.with_body(body);
	let response = transport.execute(request).await.map_err(failed)?;

	if response.status == unauthorized_status {
		return Err(RefreshError::Denied { status: response.status });
	}
	if !response.is_success() {
		return Err(failed(Error::Status {
			status: response.status,
			detail: detail_from_body(&response.body),
		}));
	}

	let update = response.json_body::<TokenUpdate>(&label).map_err(failed)?;
	let access = update.access.clone();

	session.store_tokens(update).await.map_err(failed)?;

	Ok(access)
}

/// Records the episode outcome; a failed episode tears the whole session down.
///
/// A teardown that cannot complete is reported on the returned error rather than dropped.
async fn settle(
	exchanged: RefreshOutcome,
	session: &dyn SessionStore,
	metrics: &RefreshMetrics,
	id: u64,
) -> RefreshOutcome {
	match exchanged {
		Ok(access) => {
			metrics.record_success();
			obs::record_op_outcome(OpKind::Refresh, OpOutcome::Success);
			obs::record_refresh_event(RefreshEvent::Succeeded, id);

			Ok(access)
		},
		Err(cause) => {
			metrics.record_failure();
			obs::record_op_outcome(OpKind::Refresh, OpOutcome::Failure);
			obs::record_refresh_event(RefreshEvent::Failed, id);

			match session.clear().await {
				Ok(()) => Err(cause),
				Err(teardown) => {
					metrics.record_teardown_failure();
					obs::record_refresh_event(RefreshEvent::TeardownFailed, id);

					Err(RefreshError::TeardownFailed { cause: Box::new(cause), teardown })
				},
			}
		},
	}
}

/// Returns the coordinator to idle if `id` is still the installed episode.
fn reset(in_flight: &Mutex<Option<Episode>>, id: u64) {
	let mut slot = in_flight.lock();

	if slot.as_ref().is_some_and(|episode| episode.id == id) {
		*slot = None;
	}
}

fn failed(err: impl Into<Error>) -> RefreshError {
	RefreshError::Failed(Arc::new(err.into()))
}

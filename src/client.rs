//! Authenticated request client.
//!
//! [`ApiClient::send`] attaches the stored access token to every authenticated request and
//! classifies each response as success, authorization failure, or any other error. A first
//! authorization failure enters the refresh protocol owned by the client's refresh
//! coordinator: concurrent failures share one refresh call, and every request is replayed at
//! most once with the new token. A second authorization failure on the replay is returned to
//! the caller unchanged.

mod metrics;
mod refresh;
mod request;

pub use metrics::RefreshMetrics;
pub use request::ApiRequest;

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	client::refresh::RefreshCoordinator,
	config::ClientConfig,
	error::{AuthFailure, ValidationErrors, detail_from_body},
	http::{HttpResponse, HttpTransport},
	obs::{self, OpKind, OpOutcome, OpSpan},
	session::SessionStore,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

const VALIDATION_STATUS: u16 = 400;

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport.
pub type ReqwestApiClient = ApiClient<ReqwestHttpClient>;

/// Issues backend calls with bearer attachment and singleflight token refresh.
///
/// Clones share the transport, session store, metrics, and refresh coordinator, so a refresh
/// episode started through one clone is joined by failures observed through any other.
/// Independent clients (built separately) never share episodes.
pub struct ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Validated endpoint configuration.
	pub config: ClientConfig,
	/// Transport used for every outbound call, including refresh calls.
	pub transport: Arc<T>,
	/// Session store holding the tokens and cached profile.
	pub session: Arc<dyn SessionStore>,
	/// Shared counters for refresh episodes and replays.
	pub refresh_metrics: Arc<RefreshMetrics>,
	coordinator: RefreshCoordinator,
}
impl<T> ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Creates a client that reuses the caller-provided transport.
	pub fn with_transport(
		config: ClientConfig,
		session: Arc<dyn SessionStore>,
		transport: impl Into<Arc<T>>,
	) -> Self {
		Self {
			config,
			transport: transport.into(),
			session,
			refresh_metrics: Default::default(),
			coordinator: Default::default(),
		}
	}

	/// Returns `true` while a refresh episode is in flight.
	pub fn refresh_in_flight(&self) -> bool {
		self.coordinator.in_flight()
	}

	/// Sends `request`, recovering from one authorization failure through the refresh protocol.
	///
	/// Returns the successful response, or the error that ended the request: transport
	/// failures, [`Error::Validation`] for HTTP 400, [`Error::Unauthorized`] when recovery was
	/// impossible, and [`Error::Status`] for any other non-success status.
	pub async fn send(&self, request: ApiRequest) -> Result<HttpResponse> {
		const KIND: OpKind = OpKind::Request;

		let span = OpSpan::new(KIND, "send");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span.instrument(self.send_with_recovery(request)).await;

		match &result {
			Ok(_) => obs::record_op_outcome(KIND, OpOutcome::Success),
			Err(_) => obs::record_op_outcome(KIND, OpOutcome::Failure),
		}

		result
	}

	/// Sends `request` and deserializes the successful response body.
	pub async fn send_json<R>(&self, request: ApiRequest) -> Result<R>
	where
		R: DeserializeOwned,
	{
		let path = request.path.clone();
		let response = self.send(request).await?;

		Ok(response.json_body(&path)?)
	}

	/// Forces a refresh, joining the episode in flight if there is one.
	///
	/// A failed refresh clears the session and surfaces as [`Error::Unauthorized`] carrying the
	/// refresh cause.
	pub async fn refresh_access_token(&self) -> Result<TokenSecret> {
		self.coordinator.join_or_start(self).await.map_err(|cause| {
			AuthFailure { status: self.config.unauthorized_status, detail: None, refresh: None }
				.with_refresh(cause)
				.into()
		})
	}

	async fn send_with_recovery(&self, request: ApiRequest) -> Result<HttpResponse> {
		let sent_with =
			if request.authenticated { self.session.access_token().await? } else { None };
		let response = self.dispatch(&request, sent_with.as_ref()).await?;

		if !self.config.is_unauthorized(response.status) {
			return classify(response);
		}

		let failure = AuthFailure::from_body(response.status, &response.body);

		if !request.authenticated {
			return Err(failure.into());
		}

		let fresh = match self.coordinator.recover(self, sent_with.as_ref()).await {
			Ok(token) => token,
			Err(cause) => return Err(failure.with_refresh(cause).into()),
		};

		self.refresh_metrics.record_replay();

		let replayed = self.dispatch(&request, Some(&fresh)).await?;

		// A replay is never retried again.
		if self.config.is_unauthorized(replayed.status) {
			return Err(AuthFailure::from_body(replayed.status, &replayed.body).into());
		}

		classify(replayed)
	}

	async fn dispatch(
		&self,
		request: &ApiRequest,
		bearer: Option<&TokenSecret>,
	) -> Result<HttpResponse> {
		let http = request.to_http(&self.config, bearer)?;

		Ok(self.transport.execute(http).await?)
	}
}
#[cfg(feature = "reqwest")]
impl ApiClient<ReqwestHttpClient> {
	/// Creates a client with its own reqwest-backed transport.
	pub fn new(config: ClientConfig, session: Arc<dyn SessionStore>) -> Self {
		Self::with_transport(config, session, ReqwestHttpClient::default())
	}

	/// Creates a client configured from the environment (see [`ClientConfig::from_env`]).
	pub fn from_env(session: Arc<dyn SessionStore>) -> Result<Self> {
		Ok(Self::new(ClientConfig::from_env()?, session))
	}
}
impl<T> Clone for ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self {
			config: self.config.clone(),
			transport: self.transport.clone(),
			session: self.session.clone(),
			refresh_metrics: self.refresh_metrics.clone(),
			coordinator: self.coordinator.clone(),
		}
	}
}
impl<T> Debug for ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ApiClient")
			.field("config", &self.config)
			.field("refresh_in_flight", &self.refresh_in_flight())
			.finish()
	}
}

/// Maps a response that is not an authorization failure onto the caller-facing result.
fn classify(response: HttpResponse) -> Result<HttpResponse> {
	if response.is_success() {
		return Ok(response);
	}
	if response.status == VALIDATION_STATUS {
		return Err(Error::Validation(ValidationErrors::from_body(&response.body)));
	}

	Err(Error::Status { status: response.status, detail: detail_from_body(&response.body) })
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn classify_maps_statuses() {
		let ok = classify(HttpResponse::new(204, Vec::new())).expect("2xx should pass through.");

		assert_eq!(ok.status, 204);

		let err = classify(HttpResponse::new(400, r#"{"name":["This field is required."]}"#))
			.expect_err("400 should map to a validation error.");

		assert!(matches!(
			err,
			Error::Validation(ref errors) if errors.get("name").is_some()
		));

		let err = classify(HttpResponse::new(404, r#"{"detail":"Not found."}"#))
			.expect_err("404 should map to a status error.");

		assert!(matches!(
			err,
			Error::Status { status: 404, detail: Some(ref detail) } if detail == "Not found."
		));
	}
}

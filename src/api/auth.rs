//! Login, registration, and logout.
//!
//! Login and registration are anonymous calls: they never carry a bearer credential and an
//! authorization failure (bad credentials) is returned as-is instead of starting a refresh.
//! A successful call stores the token pair and caches the returned profile in the session.

// self
use crate::{
	_prelude::*,
	auth::{TokenPair, User},
	client::{ApiClient, ApiRequest},
	http::HttpTransport,
	obs::{self, OpKind, OpOutcome, OpSpan},
};

const LOGIN_PATH: &str = "auth/login/";
const REGISTER_PATH: &str = "auth/register/";

/// Email/password pair accepted by the login endpoint.
#[derive(Clone, Serialize)]
pub struct Credentials {
	/// Account email.
	pub email: String,
	/// Account password.
	pub password: String,
}
impl Credentials {
	/// Creates a credential pair.
	pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
		Self { email: email.into(), password: password.into() }
	}
}
impl Debug for Credentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credentials")
			.field("email", &self.email)
			.field("password", &"<redacted>")
			.finish()
	}
}

/// Account details accepted by the registration endpoint.
#[derive(Clone, Serialize)]
pub struct Registration {
	/// Requested login name.
	pub username: String,
	/// Account email.
	pub email: String,
	/// Account password.
	pub password: String,
}
impl Registration {
	/// Creates a registration payload.
	pub fn new(
		username: impl Into<String>,
		email: impl Into<String>,
		password: impl Into<String>,
	) -> Self {
		Self { username: username.into(), email: email.into(), password: password.into() }
	}
}
impl Debug for Registration {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Registration")
			.field("username", &self.username)
			.field("email", &self.email)
			.field("password", &"<redacted>")
			.finish()
	}
}

/// Body returned by login and registration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
	/// Profile of the signed-in user, when the backend includes one.
	#[serde(default)]
	pub user: Option<User>,
	/// Freshly issued token pair.
	pub tokens: TokenPair,
}

impl<T> ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Signs in with `credentials`, storing the issued tokens and caching the profile.
	pub async fn login(&self, credentials: &Credentials) -> Result<AuthSession> {
		let request = ApiRequest::post(LOGIN_PATH).with_json(credentials)?.anonymous();

		self.open_session(OpKind::Login, request).await
	}

	/// Creates an account and signs it in, storing the issued tokens and caching the profile.
	pub async fn register(&self, registration: &Registration) -> Result<AuthSession> {
		let request = ApiRequest::post(REGISTER_PATH).with_json(registration)?.anonymous();

		self.open_session(OpKind::Register, request).await
	}

	/// Signs out by clearing all three session entries.
	pub async fn logout(&self) -> Result<()> {
		Ok(self.session.clear().await?)
	}

	async fn open_session(&self, kind: OpKind, request: ApiRequest) -> Result<AuthSession> {
		let span = OpSpan::new(kind, "open_session");

		obs::record_op_outcome(kind, OpOutcome::Attempt);

		let result = span
			.instrument(async move {
				let opened = self.send_json::<AuthSession>(request).await?;

				self.session.store_tokens(opened.tokens.clone().into()).await?;

				match &opened.user {
					Some(user) => self.session.cache_profile(user.clone()).await?,
					None => self.session.clear_profile().await?,
				}

				Ok(opened)
			})
			.await;

		match &result {
			Ok(_) => obs::record_op_outcome(kind, OpOutcome::Success),
			Err(_) => obs::record_op_outcome(kind, OpOutcome::Failure),
		}

		result
	}
}

//! In-memory identity holder kept in sync with a session store.
//!
//! The current identity is the cached user profile when there is one, otherwise the claims
//! decoded from the stored access token, otherwise nobody. [`AuthState`] resolves it once on
//! load and again after every session change notification, including changes made by other
//! clients or processes sharing the store.

// std
use std::sync::Weak;
// self
use crate::{
	_prelude::*,
	api::{Credentials, Registration},
	auth::{TokenClaims, TokenSecret, User},
	client::ApiClient,
	http::HttpTransport,
	session::{SessionChange, SessionSnapshot, SessionStore, SessionSubscription},
};

type Current = RwLock<Slot>;

#[derive(Debug, Default)]
struct Slot {
	identity: Option<Identity>,
	// Set once any change notification has been applied.
	notified: bool,
}

/// Who the session belongs to.
#[derive(Clone, Debug, PartialEq)]
pub enum Identity {
	/// Profile returned by the backend and cached in the session.
	Profile(User),
	/// Claims decoded from the access token when no profile is cached.
	Claims(TokenClaims),
}
impl Identity {
	/// Resolves the identity of `snapshot`.
	///
	/// A token that cannot be decoded counts as no identity.
	pub fn resolve(snapshot: &SessionSnapshot) -> Option<Self> {
		if let Some(profile) = &snapshot.user_profile {
			return Some(Self::Profile(profile.clone()));
		}

		Self::from_token(snapshot.access_token.as_ref()?)
	}

	fn from_token(token: &TokenSecret) -> Option<Self> {
		TokenClaims::decode(token.expose()).ok().map(Self::Claims)
	}

	/// Login name, when known.
	pub fn username(&self) -> Option<&str> {
		match self {
			Self::Profile(user) => user.username.as_deref(),
			Self::Claims(claims) => claims.username(),
		}
	}

	/// Email address, when known.
	pub fn email(&self) -> Option<&str> {
		match self {
			Self::Profile(user) => user.email.as_deref(),
			Self::Claims(claims) => claims.email(),
		}
	}

	/// Returns `true` for administrators.
	pub fn is_admin(&self) -> bool {
		match self {
			Self::Profile(user) => user.is_admin(),
			Self::Claims(claims) => claims.is_admin(),
		}
	}
}

/// Current identity of a session, resynchronized on every session change.
///
/// Dropping the state unsubscribes it from the store.
#[derive(Debug)]
pub struct AuthState {
	current: Arc<Current>,
	_subscription: SessionSubscription,
}
impl AuthState {
	/// Resolves the identity stored in `session` and subscribes to its changes.
	pub async fn load(session: &dyn SessionStore) -> Result<Self> {
		let current = Arc::new(RwLock::new(Slot::default()));
		let sink = Arc::downgrade(&current);
		let subscription =
			session.subscribe(Arc::new(move |change: &SessionChange| resync(&sink, change)));
		let snapshot = session.snapshot().await?;
		let mut slot = current.write();

		// A notification applied while the snapshot was read carries newer state.
		if !slot.notified {
			slot.identity = Identity::resolve(&snapshot);
		}

		drop(slot);

		Ok(Self { current, _subscription: subscription })
	}

	/// Returns the current identity.
	pub fn identity(&self) -> Option<Identity> {
		self.current.read().identity.clone()
	}

	/// Returns `true` when someone is signed in.
	pub fn is_authenticated(&self) -> bool {
		self.current.read().identity.is_some()
	}

	/// Returns `true` when the signed-in user is an administrator.
	pub fn is_admin(&self) -> bool {
		self.current.read().identity.as_ref().is_some_and(Identity::is_admin)
	}

	/// Signs in through `client` and returns the new identity.
	pub async fn login<T>(
		&self,
		client: &ApiClient<T>,
		credentials: &Credentials,
	) -> Result<Option<Identity>>
	where
		T: ?Sized + HttpTransport,
	{
		let opened = client.login(credentials).await?;

		Ok(self.adopt(opened.user, &opened.tokens.access))
	}

	/// Registers through `client` and returns the new identity.
	pub async fn register<T>(
		&self,
		client: &ApiClient<T>,
		registration: &Registration,
	) -> Result<Option<Identity>>
	where
		T: ?Sized + HttpTransport,
	{
		let opened = client.register(registration).await?;

		Ok(self.adopt(opened.user, &opened.tokens.access))
	}

	/// Signs out through `client`.
	pub async fn logout<T>(&self, client: &ApiClient<T>) -> Result<()>
	where
		T: ?Sized + HttpTransport,
	{
		client.logout().await?;

		self.current.write().identity = None;

		Ok(())
	}

	fn adopt(&self, user: Option<User>, access: &TokenSecret) -> Option<Identity> {
		let identity = match user {
			Some(user) => Some(Identity::Profile(user)),
			None => Identity::from_token(access),
		};

		self.current.write().identity.clone_from(&identity);

		identity
	}
}

fn resync(sink: &Weak<Current>, change: &SessionChange) {
	if let Some(current) = sink.upgrade() {
		let mut slot = current.write();

		slot.identity = Identity::resolve(&change.snapshot);
		slot.notified = true;
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
	use tokio::runtime::Runtime;
	// self
	use super::*;
	use crate::{
		auth::TokenUpdate,
		session::{MemorySessionStore, SessionFuture, SessionListener},
	};

	/// Store that commits a login while the initial snapshot is in flight, then returns the
	/// older snapshot.
	struct LoginDuringLoad {
		inner: MemorySessionStore,
		token: String,
	}
	impl SessionStore for LoginDuringLoad {
		fn access_token(&self) -> SessionFuture<'_, Option<TokenSecret>> {
			self.inner.access_token()
		}

		fn refresh_token(&self) -> SessionFuture<'_, Option<TokenSecret>> {
			self.inner.refresh_token()
		}

		fn store_tokens(&self, update: TokenUpdate) -> SessionFuture<'_, ()> {
			self.inner.store_tokens(update)
		}

		fn cached_profile(&self) -> SessionFuture<'_, Option<User>> {
			self.inner.cached_profile()
		}

		fn cache_profile(&self, profile: User) -> SessionFuture<'_, ()> {
			self.inner.cache_profile(profile)
		}

		fn clear_profile(&self) -> SessionFuture<'_, ()> {
			self.inner.clear_profile()
		}

		fn clear(&self) -> SessionFuture<'_, ()> {
			self.inner.clear()
		}

		fn snapshot(&self) -> SessionFuture<'_, SessionSnapshot> {
			Box::pin(async move {
				let before = self.inner.snapshot().await?;

				self.inner
					.store_tokens(TokenUpdate::access_only(TokenSecret::new(self.token.clone())))
					.await?;

				Ok(before)
			})
		}

		fn subscribe(&self, listener: SessionListener) -> SessionSubscription {
			self.inner.subscribe(listener)
		}
	}

	fn token_with(payload: &str) -> String {
		format!("e30.{}.signature", URL_SAFE_NO_PAD.encode(payload))
	}

	fn admin_profile() -> User {
		serde_json::from_str(r#"{"id":2,"username":"admin","role":"admin"}"#)
			.expect("Profile fixture should parse.")
	}

	#[test]
	fn resolution_prefers_profile_then_claims() {
		let claims_only = SessionSnapshot {
			access_token: Some(TokenSecret::new(token_with(r#"{"username":"jdoe"}"#))),
			..Default::default()
		};
		let with_profile =
			SessionSnapshot { user_profile: Some(admin_profile()), ..claims_only.clone() };
		let garbage = SessionSnapshot {
			access_token: Some(TokenSecret::new("not-a-jwt")),
			..Default::default()
		};

		assert_eq!(
			Identity::resolve(&claims_only).as_ref().and_then(Identity::username),
			Some("jdoe")
		);
		assert!(Identity::resolve(&with_profile).is_some_and(|identity| identity.is_admin()));
		assert_eq!(Identity::resolve(&garbage), None);
		assert_eq!(Identity::resolve(&SessionSnapshot::default()), None);
	}

	#[test]
	fn state_follows_session_changes() {
		let rt = Runtime::new().expect("Failed to build Tokio runtime for auth state test.");
		let store = MemorySessionStore::default();
		let state = rt.block_on(AuthState::load(&store)).expect("Loading auth state should succeed.");

		assert!(!state.is_authenticated());

		rt.block_on(store.store_tokens(TokenUpdate::access_only(TokenSecret::new(token_with(
			r#"{"username":"jdoe","role":"customer"}"#,
		)))))
		.expect("Storing a token should succeed.");

		assert!(state.is_authenticated());
		assert!(!state.is_admin());

		rt.block_on(store.cache_profile(admin_profile())).expect("Caching should succeed.");

		assert!(state.is_admin());

		rt.block_on(store.clear()).expect("Clearing should succeed.");

		assert!(!state.is_authenticated());
	}

	#[test]
	fn change_during_load_is_not_overwritten() {
		let rt = Runtime::new().expect("Failed to build Tokio runtime for auth state test.");
		let store = LoginDuringLoad {
			inner: MemorySessionStore::default(),
			token: token_with(r#"{"username":"jdoe"}"#),
		};
		let state = rt.block_on(AuthState::load(&store)).expect("Loading auth state should succeed.");

		assert!(state.is_authenticated());
		assert_eq!(state.identity().as_ref().and_then(Identity::username), Some("jdoe"));
	}
}

//! Thread-safe in-memory [`SessionStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	auth::{TokenSecret, TokenUpdate, User},
	session::{
		SessionEvents, SessionFuture, SessionListener, SessionSnapshot, SessionStore,
		SessionSubscription, StoreError,
	},
};

/// Thread-safe session backend that keeps entries in-process.
///
/// Clones share the same entries and listeners.
#[derive(Clone, Debug, Default)]
pub struct MemorySessionStore {
	state: Arc<RwLock<SessionSnapshot>>,
	events: SessionEvents,
}
impl MemorySessionStore {
	/// Creates a store seeded with `snapshot`.
	pub fn with_snapshot(snapshot: SessionSnapshot) -> Self {
		Self { state: Arc::new(RwLock::new(snapshot)), events: SessionEvents::default() }
	}

	/// Creates a store holding an access/refresh pair.
	pub fn with_tokens(access: impl Into<String>, refresh: impl Into<String>) -> Self {
		Self::with_snapshot(SessionSnapshot {
			access_token: Some(TokenSecret::new(access)),
			refresh_token: Some(TokenSecret::new(refresh)),
			user_profile: None,
		})
	}

	/// Returns a copy of the current entries without going through the async contract.
	pub fn current(&self) -> SessionSnapshot {
		self.state.read().clone()
	}

	/// Applies `mutate` and publishes a change for every entry it modified.
	fn update_now(&self, mutate: impl FnOnce(&mut SessionSnapshot)) {
		let (changed, after) = {
			let mut guard = self.state.write();
			let before = guard.clone();

			mutate(&mut guard);

			(before.changed_keys(&guard), guard.clone())
		};

		self.events.publish(&changed, &after);
	}
}
impl SessionStore for MemorySessionStore {
	fn access_token(&self) -> SessionFuture<'_, Option<TokenSecret>> {
		Box::pin(async move {
			let value = self.state.read().access_token.clone();

			Ok(value)
		})
	}

	fn refresh_token(&self) -> SessionFuture<'_, Option<TokenSecret>> {
		Box::pin(async move {
			let value = self.state.read().refresh_token.clone();

			Ok(value)
		})
	}

	fn store_tokens(&self, update: TokenUpdate) -> SessionFuture<'_, ()> {
		Box::pin(async move {
			self.update_now(|state| state.apply_tokens(update));

			Ok(())
		})
	}

	fn cached_profile(&self) -> SessionFuture<'_, Option<User>> {
		Box::pin(async move {
			let value = self.state.read().user_profile.clone();

			Ok(value)
		})
	}

	fn cache_profile(&self, profile: User) -> SessionFuture<'_, ()> {
		Box::pin(async move {
			self.update_now(|state| state.user_profile = Some(profile));

			Ok(())
		})
	}

	fn clear_profile(&self) -> SessionFuture<'_, ()> {
		Box::pin(async move {
			self.update_now(|state| state.user_profile = None);

			Ok(())
		})
	}

	fn clear(&self) -> SessionFuture<'_, ()> {
		Box::pin(async move {
			self.update_now(|state| *state = SessionSnapshot::default());

			Ok(())
		})
	}

	fn snapshot(&self) -> SessionFuture<'_, SessionSnapshot> {
		Box::pin(async move { Ok::<_, StoreError>(self.current()) })
	}

	fn subscribe(&self, listener: SessionListener) -> SessionSubscription {
		self.events.subscribe(listener)
	}
}

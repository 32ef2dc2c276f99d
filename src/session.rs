//! Session persistence contracts and built-in store implementations.
//!
//! A session is three named entries (access token, refresh token, cached user profile).
//! Stores publish a [`SessionChange`] for every entry that changes so other holders of the
//! same session (identity caches, other client instances) can resynchronize. Notifications are
//! best-effort: they carry no ordering or atomicity guarantee relative to writers outside this
//! process.

pub mod events;
pub mod file;
pub mod memory;

pub use events::*;
pub use file::FileSessionStore;
pub use memory::MemorySessionStore;

// self
use crate::{
	_prelude::*,
	auth::{TokenSecret, TokenUpdate, User},
};

/// Boxed future returned by [`SessionStore`] operations.
pub type SessionFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Storage backend contract implemented by session stores.
pub trait SessionStore
where
	Self: Send + Sync,
{
	/// Reads the current access token.
	fn access_token(&self) -> SessionFuture<'_, Option<TokenSecret>>;

	/// Reads the current refresh token.
	fn refresh_token(&self) -> SessionFuture<'_, Option<TokenSecret>>;

	/// Writes a new access token and, when present, a new refresh token.
	///
	/// A missing refresh token keeps the previously stored one.
	fn store_tokens(&self, update: TokenUpdate) -> SessionFuture<'_, ()>;

	/// Reads the cached user profile.
	fn cached_profile(&self) -> SessionFuture<'_, Option<User>>;

	/// Replaces the cached user profile.
	fn cache_profile(&self, profile: User) -> SessionFuture<'_, ()>;

	/// Removes the cached user profile only.
	fn clear_profile(&self) -> SessionFuture<'_, ()>;

	/// Removes all three entries in one step.
	fn clear(&self) -> SessionFuture<'_, ()>;

	/// Returns a copy of all three entries.
	fn snapshot(&self) -> SessionFuture<'_, SessionSnapshot>;

	/// Registers `listener` for change notifications until the returned guard is dropped.
	fn subscribe(&self, listener: SessionListener) -> SessionSubscription;
}

/// Names of the persisted session entries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SessionKey {
	/// Access token entry.
	#[serde(rename = "access_token")]
	AccessToken,
	/// Refresh token entry.
	#[serde(rename = "refresh_token")]
	RefreshToken,
	/// Cached user profile entry.
	#[serde(rename = "user_profile")]
	UserProfile,
}
impl SessionKey {
	/// All entries, in storage order.
	pub const ALL: [SessionKey; 3] =
		[SessionKey::AccessToken, SessionKey::RefreshToken, SessionKey::UserProfile];

	/// Returns the storage key name.
	pub const fn as_str(self) -> &'static str {
		match self {
			SessionKey::AccessToken => "access_token",
			SessionKey::RefreshToken => "refresh_token",
			SessionKey::UserProfile => "user_profile",
		}
	}
}
impl Display for SessionKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Point-in-time copy of all session entries.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
	/// Stored access token.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub access_token: Option<TokenSecret>,
	/// Stored refresh token.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub refresh_token: Option<TokenSecret>,
	/// Cached user profile.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub user_profile: Option<User>,
}
impl SessionSnapshot {
	/// Returns `true` when no entry is present.
	pub fn is_empty(&self) -> bool {
		self.access_token.is_none() && self.refresh_token.is_none() && self.user_profile.is_none()
	}

	/// Lists the entries whose values differ between `self` and `other`.
	pub fn changed_keys(&self, other: &Self) -> Vec<SessionKey> {
		SessionKey::ALL
			.into_iter()
			.filter(|key| match key {
				SessionKey::AccessToken => self.access_token != other.access_token,
				SessionKey::RefreshToken => self.refresh_token != other.refresh_token,
				SessionKey::UserProfile => self.user_profile != other.user_profile,
			})
			.collect()
	}

	pub(crate) fn apply_tokens(&mut self, update: TokenUpdate) {
		self.access_token = Some(update.access);

		if let Some(refresh) = update.refresh {
			self.refresh_token = Some(refresh);
		}
	}
}

/// Error type produced by [`SessionStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

#[cfg(test)]
mod tests {
	// std
	use std::error::Error as StdError;
	// self
	use super::*;

	#[test]
	fn store_error_converts_into_client_error_with_source() {
		let store_error = StoreError::Backend { message: "disk unavailable".into() };
		let client_error: Error = store_error.clone().into();

		assert!(matches!(client_error, Error::Storage(_)));
		assert!(client_error.to_string().contains("disk unavailable"));

		let source = StdError::source(&client_error)
			.expect("Client error should expose the original store error as its source.");

		assert_eq!(source.to_string(), store_error.to_string());
	}

	#[test]
	fn token_update_keeps_previous_refresh_token() {
		let mut snapshot = SessionSnapshot::default();

		snapshot.apply_tokens(TokenUpdate {
			access: TokenSecret::new("access_v1"),
			refresh: Some(TokenSecret::new("refresh_v1")),
		});
		snapshot.apply_tokens(TokenUpdate::access_only("access_v2"));

		assert_eq!(snapshot.access_token, Some(TokenSecret::new("access_v2")));
		assert_eq!(snapshot.refresh_token, Some(TokenSecret::new("refresh_v1")));
	}

	#[test]
	fn changed_keys_lists_differing_entries() {
		let before = SessionSnapshot {
			access_token: Some(TokenSecret::new("access_v1")),
			refresh_token: Some(TokenSecret::new("refresh_v1")),
			user_profile: None,
		};
		let mut after = before.clone();

		after.access_token = Some(TokenSecret::new("access_v2"));

		assert_eq!(before.changed_keys(&after), vec![SessionKey::AccessToken]);
		assert_eq!(
			before.changed_keys(&SessionSnapshot::default()),
			vec![SessionKey::AccessToken, SessionKey::RefreshToken]
		);
	}

	#[test]
	fn session_keys_use_storage_names() {
		let names = SessionKey::ALL.map(SessionKey::as_str);

		assert_eq!(names, ["access_token", "refresh_token", "user_profile"]);
		assert_eq!(
			serde_json::to_string(&SessionKey::UserProfile).expect("Keys should serialize."),
			"\"user_profile\""
		);
	}
}

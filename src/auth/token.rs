//! Token secrets and the pair/update shapes exchanged with the backend.

// self
use crate::_prelude::*;

/// Redacted token secret wrapper keeping sensitive material out of logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Formats the secret as an `Authorization` header value.
	pub fn bearer(&self) -> String {
		format!("Bearer {}", self.0)
	}
}
impl AsRef<str> for TokenSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl From<&str> for TokenSecret {
	fn from(value: &str) -> Self {
		Self::new(value)
	}
}
impl From<String> for TokenSecret {
	fn from(value: String) -> Self {
		Self::new(value)
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Access/refresh pair issued by login and registration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
	/// Short-lived bearer credential.
	pub access: TokenSecret,
	/// Long-lived credential exchanged for new access tokens.
	pub refresh: TokenSecret,
}
impl TokenPair {
	/// Creates a pair from raw strings.
	pub fn new(access: impl Into<String>, refresh: impl Into<String>) -> Self {
		Self { access: TokenSecret::new(access), refresh: TokenSecret::new(refresh) }
	}
}

/// Token write applied to a session store.
///
/// A missing refresh token keeps the previously stored one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUpdate {
	/// New access token.
	pub access: TokenSecret,
	/// Rotated refresh token, if the backend issued one.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub refresh: Option<TokenSecret>,
}
impl TokenUpdate {
	/// Creates an update that only replaces the access token.
	pub fn access_only(access: impl Into<TokenSecret>) -> Self {
		Self { access: access.into(), refresh: None }
	}
}
impl From<TokenPair> for TokenUpdate {
	fn from(pair: TokenPair) -> Self {
		Self { access: pair.access, refresh: Some(pair.refresh) }
	}
}

//! Decode-only reader for JWT access-token payloads.
//!
//! Signatures are not verified: the backend remains the authority and these claims only drive
//! lightweight client-side decisions (who is signed in, whether to show admin tooling).

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
// self
use crate::{_prelude::*, auth::user};

/// Errors raised while decoding a token payload.
#[derive(Debug, ThisError)]
pub enum ClaimsError {
	/// The token does not have the `header.payload.signature` shape.
	#[error("Token is not a three-segment JWT.")]
	Malformed,
	/// The payload segment is not valid base64url.
	#[error("Token payload is not valid base64url.")]
	Encoding(#[from] base64::DecodeError),
	/// The payload is not a JSON object.
	#[error("Token payload is not a JSON object.")]
	Payload(#[from] serde_json::Error),
}

/// Claims decoded from an access token.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims(pub serde_json::Map<String, serde_json::Value>);
impl TokenClaims {
	/// Decodes the payload segment of `token`.
	pub fn decode(token: &str) -> Result<Self, ClaimsError> {
		let mut segments = token.split('.');
		let (Some(_header), Some(payload), Some(_signature), None) =
			(segments.next(), segments.next(), segments.next(), segments.next())
		else {
			return Err(ClaimsError::Malformed);
		};
		// Some issuers pad the segment even though JWTs must not.
		let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('='))?;

		Ok(Self(serde_json::from_slice(&bytes)?))
	}

	/// Returns a raw claim.
	pub fn get(&self, name: &str) -> Option<&serde_json::Value> {
		self.0.get(name)
	}

	/// Returns `user_id`, falling back to `sub`, rendered as a string.
	pub fn user_id(&self) -> Option<String> {
		self.get("user_id").or_else(|| self.get("sub")).and_then(|value| match value {
			serde_json::Value::String(id) => Some(id.clone()),
			serde_json::Value::Number(id) => Some(id.to_string()),
			_ => None,
		})
	}

	/// Returns the `email` claim.
	pub fn email(&self) -> Option<&str> {
		self.get("email")?.as_str()
	}

	/// Returns the `username` claim.
	pub fn username(&self) -> Option<&str> {
		self.get("username")?.as_str()
	}

	/// Returns the `role` claim.
	pub fn role(&self) -> Option<&str> {
		self.get("role")?.as_str()
	}

	/// Returns the string entries of the `roles` claim.
	pub fn roles(&self) -> Vec<&str> {
		self.get("roles")
			.and_then(serde_json::Value::as_array)
			.map(|roles| roles.iter().filter_map(serde_json::Value::as_str).collect())
			.unwrap_or_default()
	}

	/// Returns `true` when the claims mark the bearer as an administrator.
	pub fn is_admin(&self) -> bool {
		user::is_admin_role(self.role(), self.roles())
	}

	/// Returns the `exp` claim as an instant.
	pub fn expires_at(&self) -> Option<OffsetDateTime> {
		let exp = self.get("exp")?.as_i64()?;

		OffsetDateTime::from_unix_timestamp(exp).ok()
	}

	/// Returns `true` when `exp` lies at or before `now`. Tokens without `exp` never expire.
	pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
		self.expires_at().is_some_and(|exp| exp <= now)
	}
}

//! User profiles returned by the auth endpoints.

// self
use crate::_prelude::*;

const ADMIN_ROLE: &str = "admin";

/// Backend user identifier: numeric on current backends, opaque text on others.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserId {
	/// Numeric primary key.
	Number(u64),
	/// Opaque identifier (UUID or similar).
	Text(String),
}
impl Display for UserId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Number(id) => write!(f, "{id}"),
			Self::Text(id) => f.write_str(id),
		}
	}
}

/// User profile as returned by login/registration and cached in the session store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
	/// Backend identifier, when the response carries one.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id: Option<UserId>,
	/// Login name.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub username: Option<String>,
	/// Email address.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub email: Option<String>,
	/// Single role label (`customer`, `admin`).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub role: Option<String>,
	/// Role list used by some backend revisions instead of `role`.
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub roles: Vec<String>,
	/// Any other profile fields, preserved verbatim.
	#[serde(flatten)]
	pub extra: serde_json::Map<String, serde_json::Value>,
}
impl User {
	/// Returns `true` when the profile marks the user as an administrator.
	pub fn is_admin(&self) -> bool {
		is_admin_role(self.role.as_deref(), self.roles.iter().map(String::as_str))
	}
}

pub(crate) fn is_admin_role<'a>(
	role: Option<&str>,
	roles: impl IntoIterator<Item = &'a str>,
) -> bool {
	role == Some(ADMIN_ROLE) || roles.into_iter().any(|role| role == ADMIN_ROLE)
}

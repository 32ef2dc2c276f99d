//! Client-level error types shared across the transport, session, and endpoint layers.

// self
use crate::_prelude::*;

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

const UNKNOWN_ERROR: &str = "Unknown error";
const NON_FIELD_ERRORS: &str = "non_field_errors";

/// Canonical client error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Session storage failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::session::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Response body did not match the expected shape.
	#[error(transparent)]
	Decode(#[from] DecodeError),
	/// The backend denied authorization and the session could not be recovered.
	#[error(transparent)]
	Unauthorized(#[from] AuthFailure),
	/// The backend rejected the payload with structured field errors.
	#[error("Request failed validation: {0}.")]
	Validation(ValidationErrors),
	/// Any other non-success status.
	#[error("Backend responded with HTTP {status}.")]
	Status {
		/// HTTP status code.
		status: u16,
		/// `detail` message from the response body, when present.
		detail: Option<String>,
	},
}
impl Error {
	/// Flattens the error into field-level messages suitable for form display.
	///
	/// Structured validation errors are returned as-is, a `detail` message becomes a single
	/// `non_field_errors` entry, and everything else maps to `"Unknown error"`.
	pub fn field_errors(&self) -> ValidationErrors {
		match self {
			Self::Validation(errors) => errors.clone(),
			Self::Status { detail: Some(detail), .. }
			| Self::Unauthorized(AuthFailure { detail: Some(detail), .. }) =>
				ValidationErrors::non_field(detail.clone()),
			_ => ValidationErrors::non_field(UNKNOWN_ERROR),
		}
	}

	/// Returns `true` when the error is an unrecovered authorization failure.
	pub fn is_unauthorized(&self) -> bool {
		matches!(self, Self::Unauthorized(_))
	}
}

/// Configuration and validation failures raised while building the client.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Base URL could not be parsed.
	#[error("Base URL `{url}` is invalid.")]
	InvalidBaseUrl {
		/// Raw value that failed to parse.
		url: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Base URL uses a scheme other than http or https.
	#[error("Base URL must use http or https, got `{scheme}`.")]
	UnsupportedScheme {
		/// Offending scheme.
		scheme: String,
	},
	/// A request path could not be joined onto the base URL.
	#[error("Request path `{path}` cannot be resolved against the base URL.")]
	InvalidPath {
		/// Offending path.
		path: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Request body could not be serialized.
	#[error("Request body could not be serialized.")]
	RequestBody(#[from] serde_json::Error),
	/// Status code is outside the HTTP range.
	#[error("Status code {0} is not a valid HTTP status.")]
	InvalidStatus(u16),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the backend.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the backend.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

/// Response body failed to deserialize into the expected type.
#[derive(Debug, ThisError)]
#[error("Response from `{path}` (HTTP {status}) could not be decoded.")]
pub struct DecodeError {
	/// Request path that produced the body.
	pub path: String,
	/// HTTP status of the response.
	pub status: u16,
	/// Structured parsing failure including the JSON path.
	#[source]
	pub source: serde_path_to_error::Error<serde_json::Error>,
}

/// Authorization failure reported by the backend.
///
/// When the failure triggered a refresh episode that did not succeed, the episode's cause is
/// attached as [`AuthFailure::refresh`] and exposed through [`std::error::Error::source`], so
/// callers see the original failure while diagnostics can still reach the refresh cause.
#[derive(Clone, Debug, ThisError)]
#[error("Backend denied authorization with HTTP {status}.")]
pub struct AuthFailure {
	/// HTTP status code (the configured unauthorized status).
	pub status: u16,
	/// `detail` message from the response body, when present.
	pub detail: Option<String>,
	/// Why the refresh episode failed, if one ran.
	#[source]
	pub refresh: Option<RefreshError>,
}
impl AuthFailure {
	/// Builds a failure from the raw response status and body.
	pub fn from_body(status: u16, body: &[u8]) -> Self {
		Self { status, detail: detail_from_body(body), refresh: None }
	}

	/// Attaches the refresh cause.
	pub fn with_refresh(mut self, cause: RefreshError) -> Self {
		self.refresh = Some(cause);

		self
	}
}

/// Reasons a refresh episode can fail. Cloned to every request waiting on the episode.
#[derive(Clone, Debug, ThisError)]
pub enum RefreshError {
	/// No refresh token is stored.
	#[error("No refresh token is available.")]
	Unavailable,
	/// The refresh endpoint itself denied authorization.
	#[error("Refresh endpoint rejected the refresh token with HTTP {status}.")]
	Denied {
		/// HTTP status returned by the refresh endpoint.
		status: u16,
	},
	/// Transport, storage, decoding, or unexpected-status failure during the refresh call.
	#[error("Refresh call failed.")]
	Failed(#[source] Arc<Error>),
	/// The refresh failed and the session could not be cleared afterwards; stored credentials
	/// may still be present.
	#[error("Refresh failed and the session could not be cleared.")]
	TeardownFailed {
		/// Why the refresh episode failed.
		cause: Box<RefreshError>,
		/// Why clearing the session failed.
		#[source]
		teardown: crate::session::StoreError,
	},
}
impl RefreshError {
	/// Returns the refresh failure itself, looking through a failed teardown.
	pub fn cause(&self) -> &RefreshError {
		match self {
			Self::TeardownFailed { cause, .. } => cause,
			_ => self,
		}
	}

	/// Returns the store error when the session could not be cleared.
	pub fn teardown_error(&self) -> Option<&crate::session::StoreError> {
		match self {
			Self::TeardownFailed { teardown, .. } => Some(teardown),
			_ => None,
		}
	}
}

/// Field-level validation messages keyed by field name.
///
/// Messages that do not belong to a field live under `non_field_errors`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(pub BTreeMap<String, Vec<String>>);
impl ValidationErrors {
	/// Creates a set holding a single non-field message.
	pub fn non_field(message: impl Into<String>) -> Self {
		let mut map = BTreeMap::new();

		map.insert(NON_FIELD_ERRORS.to_owned(), vec![message.into()]);

		Self(map)
	}

	/// Parses a backend error body.
	///
	/// A string `detail` becomes a non-field message; any other JSON object is read as a field
	/// map whose values may be strings, string lists, or arbitrary JSON (rendered as text).
	pub fn from_body(body: &[u8]) -> Self {
		let Ok(serde_json::Value::Object(object)) = serde_json::from_slice(body) else {
			return Self::non_field(UNKNOWN_ERROR);
		};

		if let Some(serde_json::Value::String(detail)) = object.get("detail") {
			return Self::non_field(detail.clone());
		}

		let map = object
			.into_iter()
			.map(|(field, value)| {
				let messages = match value {
					serde_json::Value::String(message) => vec![message],
					serde_json::Value::Array(values) => values
						.into_iter()
						.map(|value| match value {
							serde_json::Value::String(message) => message,
							other => other.to_string(),
						})
						.collect(),
					other => vec![other.to_string()],
				};

				(field, messages)
			})
			.collect::<BTreeMap<_, _>>();

		if map.is_empty() { Self::non_field(UNKNOWN_ERROR) } else { Self(map) }
	}

	/// Returns the messages for `field`, if any.
	pub fn get(&self, field: &str) -> Option<&[String]> {
		self.0.get(field).map(Vec::as_slice)
	}

	/// Returns the non-field messages, if any.
	pub fn non_field_errors(&self) -> Option<&[String]> {
		self.get(NON_FIELD_ERRORS)
	}

	/// Returns `true` when no messages are present.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
impl Display for ValidationErrors {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		for (idx, (field, messages)) in self.0.iter().enumerate() {
			if idx > 0 {
				f.write_str("; ")?;
			}

			write!(f, "{field}: {}", messages.join(" "))?;
		}

		Ok(())
	}
}

/// Extracts a string `detail` field from a JSON error body.
pub(crate) fn detail_from_body(body: &[u8]) -> Option<String> {
	#[derive(Deserialize)]
	struct Detail {
		detail: Option<serde_json::Value>,
	}

	match serde_json::from_slice::<Detail>(body).ok()?.detail? {
		serde_json::Value::String(detail) => Some(detail),
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn detail_maps_to_non_field_errors() {
		let errors = ValidationErrors::from_body(br#"{"detail":"invalid"}"#);

		assert_eq!(errors.non_field_errors(), Some(&["invalid".to_owned()][..]));
		assert_eq!(errors.0.len(), 1);
	}

	#[test]
	fn field_errors_are_preserved() {
		let errors =
			ValidationErrors::from_body(br#"{"email":["taken"],"password":"short","age":[3]}"#);

		assert_eq!(errors.get("email"), Some(&["taken".to_owned()][..]));
		assert_eq!(errors.get("password"), Some(&["short".to_owned()][..]));
		assert_eq!(errors.get("age"), Some(&["3".to_owned()][..]));
		assert_eq!(errors.non_field_errors(), None);
	}

	#[test]
	fn unparseable_bodies_fall_back_to_unknown_error() {
		for body in [&b"<html>oops</html>"[..], b"[]", b"{}"] {
			let errors = ValidationErrors::from_body(body);

			assert_eq!(errors.non_field_errors(), Some(&[UNKNOWN_ERROR.to_owned()][..]));
		}
	}

	#[test]
	fn field_errors_flatten_other_variants() {
		let status = Error::Status { status: 404, detail: Some("Not found.".into()) };

		assert_eq!(status.field_errors().non_field_errors(), Some(&["Not found.".to_owned()][..]));

		let transport = Error::from(TransportError::Io(std::io::Error::other("reset")));

		assert_eq!(
			transport.field_errors().non_field_errors(),
			Some(&[UNKNOWN_ERROR.to_owned()][..])
		);
	}

	#[test]
	fn auth_failure_exposes_refresh_cause_as_source() {
		let failure = AuthFailure::from_body(401, br#"{"detail":"token_expired"}"#)
			.with_refresh(RefreshError::Denied { status: 401 });
		let err = Error::from(failure);

		assert!(err.is_unauthorized());
		assert_eq!(err.field_errors().non_field_errors(), Some(&["token_expired".to_owned()][..]));

		let source = StdError::source(&err).expect("Auth failures should expose a source.");

		assert_eq!(source.to_string(), "Refresh endpoint rejected the refresh token with HTTP 401.");
	}

	#[test]
	fn teardown_failure_keeps_refresh_cause_and_store_source() {
		let err = RefreshError::TeardownFailed {
			cause: Box::new(RefreshError::Denied { status: 401 }),
			teardown: crate::session::StoreError::Backend { message: "disk full".into() },
		};

		assert!(matches!(err.cause(), RefreshError::Denied { status: 401 }));
		assert!(RefreshError::Unavailable.teardown_error().is_none());

		let source = StdError::source(&err).expect("Teardown failures should expose a source.");

		assert_eq!(source.to_string(), "Backend failure: disk full.");
	}
}

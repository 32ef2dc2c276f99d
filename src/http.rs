//! Transport primitives for backend calls.
//!
//! [`HttpTransport`] is the client's only dependency on an HTTP stack. The client hands it fully
//! resolved [`HttpRequest`] values (absolute URL, final headers, serialized body) and receives
//! raw [`HttpResponse`] values back; status classification, bearer attachment, and refresh
//! coordination all happen above this seam so custom transports (including test fakes) get the
//! same behavior as the bundled reqwest implementation.

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	error::{DecodeError, TransportError},
};

/// Boxed future returned by [`HttpTransport::execute`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<HttpResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP stacks capable of executing backend calls.
///
/// Implementations must be `Send + Sync + 'static` so a transport can be shared across client
/// clones and driven from within a refresh episode that outlives the request that started it.
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Sends `request` and resolves with the raw response, whatever its status.
	///
	/// Only failures that prevent a response from arriving (DNS, TCP, TLS, IO) are errors.
	fn execute(&self, request: HttpRequest) -> TransportFuture<'_>;
}

/// HTTP verbs used by the storefront API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Method {
	/// `GET`.
	Get,
	/// `POST`.
	Post,
	/// `PUT`.
	Put,
	/// `PATCH`.
	Patch,
	/// `DELETE`.
	Delete,
}
impl Method {
	/// Returns the canonical upper-case verb.
	pub const fn as_str(self) -> &'static str {
		match self {
			Method::Get => "GET",
			Method::Post => "POST",
			Method::Put => "PUT",
			Method::Patch => "PATCH",
			Method::Delete => "DELETE",
		}
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Fully resolved request handed to a transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpRequest {
	/// HTTP verb.
	pub method: Method,
	/// Absolute URL including query string.
	pub url: Url,
	/// Header names are lower-case.
	pub headers: BTreeMap<String, String>,
	/// Serialized body, if any.
	pub body: Option<Vec<u8>>,
}
impl HttpRequest {
	/// Creates a request without headers or body.
	pub fn new(method: Method, url: Url) -> Self {
		Self { method, url, headers: BTreeMap::new(), body: None }
	}

	/// Adds or replaces a header; the name is stored lower-case.
	pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
		self.headers.insert(name.as_ref().to_ascii_lowercase(), value.into());

		self
	}

	/// Sets the body.
	pub fn with_body(mut self, body: Vec<u8>) -> Self {
		self.body = Some(body);

		self
	}

	/// Returns the header value for `name` (case-insensitive).
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
	}

	/// Returns the bearer credential carried by the request, if any.
	pub fn bearer(&self) -> Option<&str> {
		self.header("authorization")?.strip_prefix("Bearer ")
	}
}

/// Raw response returned by a transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpResponse {
	/// HTTP status code.
	pub status: u16,
	/// Header names are lower-case.
	pub headers: BTreeMap<String, String>,
	/// Raw body bytes.
	pub body: Vec<u8>,
}
impl HttpResponse {
	/// Creates a response with the provided status and body.
	pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
		Self { status, headers: BTreeMap::new(), body: body.into() }
	}

	/// Creates a JSON response.
	pub fn json(status: u16, value: &serde_json::Value) -> Self {
		Self::new(status, value.to_string())
			.with_header("content-type", "application/json")
	}

	/// Adds or replaces a header; the name is stored lower-case.
	pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
		self.headers.insert(name.as_ref().to_ascii_lowercase(), value.into());

		self
	}

	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Deserializes the body, reporting the failing JSON path on error.
	///
	/// `path` only labels the error.
	pub fn json_body<T>(&self, path: &str) -> Result<T, DecodeError>
	where
		T: DeserializeOwned,
	{
		let mut de = serde_json::Deserializer::from_slice(&self.body);

		serde_path_to_error::deserialize(&mut de).map_err(|source| DecodeError {
			path: path.to_owned(),
			status: self.status,
			source,
		})
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Redirects are followed per the wrapped client's policy; the default client follows up to ten.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	async fn send(client: ReqwestClient, request: HttpRequest) -> Result<HttpResponse, TransportError> {
		let method = match request.method {
			Method::Get => reqwest::Method::GET,
			Method::Post => reqwest::Method::POST,
			Method::Put => reqwest::Method::PUT,
			Method::Patch => reqwest::Method::PATCH,
			Method::Delete => reqwest::Method::DELETE,
		};
		let mut builder = client.request(method, request.url);

		for (name, value) in &request.headers {
			builder = builder.header(name.as_str(), value.as_str());
		}
		if let Some(body) = request.body {
			builder = builder.body(body);
		}

		let response = builder.send().await?;
		let status = response.status().as_u16();
		let headers = response
			.headers()
			.iter()
			.filter_map(|(name, value)| {
				value.to_str().ok().map(|value| (name.as_str().to_owned(), value.to_owned()))
			})
			.collect();
		let body = response.bytes().await?.to_vec();

		Ok(HttpResponse { status, headers, body })
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestHttpClient {
	fn execute(&self, request: HttpRequest) -> TransportFuture<'_> {
		let client = self.0.clone();

		Box::pin(Self::send(client, request))
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn headers_are_case_insensitive() {
		let url = Url::parse("http://localhost/api/sweets/").expect("Fixture URL should parse.");
		let request =
			HttpRequest::new(Method::Get, url).with_header("Authorization", "Bearer access_v1");

		assert_eq!(request.header("AUTHORIZATION"), Some("Bearer access_v1"));
		assert_eq!(request.bearer(), Some("access_v1"));
	}

	#[test]
	fn json_body_reports_failing_path() {
		#[derive(Debug, Deserialize)]
		struct Row {
			#[allow(dead_code)]
			id: u64,
		}

		let response = HttpResponse::new(200, r#"[{"id":1},{"id":"two"}]"#);
		let err = response
			.json_body::<Vec<Row>>("sweets/")
			.expect_err("Mistyped rows should fail to decode.");

		assert_eq!(err.status, 200);
		assert_eq!(err.path, "sweets/");
		assert_eq!(err.source.path().to_string(), "[1].id");
	}
}

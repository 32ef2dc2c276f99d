//! Relative request descriptions kept by the client so a rejected call can be replayed.

// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	config::ClientConfig,
	error::ConfigError,
	http::{HttpRequest, Method},
};

const JSON: &str = "application/json";

/// A backend call described relative to the API root.
///
/// The description is resolved into an [`HttpRequest`] on every attempt, so a replay after a
/// refresh carries the same method, path, query, headers, and body with only the bearer
/// credential swapped.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiRequest {
	/// HTTP verb.
	pub method: Method,
	/// Path relative to the API root (for example `sweets/3/`).
	pub path: String,
	/// Query parameters in insertion order.
	pub query: Vec<(String, String)>,
	/// Extra headers; names are lower-case.
	pub headers: BTreeMap<String, String>,
	/// JSON body, if any.
	pub body: Option<serde_json::Value>,
	/// Whether the stored access token is attached and authorization failures are recovered.
	pub authenticated: bool,
}
impl ApiRequest {
	/// Creates an authenticated request without query, headers, or body.
	pub fn new(method: Method, path: impl Into<String>) -> Self {
		Self {
			method,
			path: path.into(),
			query: Vec::new(),
			headers: BTreeMap::new(),
			body: None,
			authenticated: true,
		}
	}

	/// `GET` request.
	pub fn get(path: impl Into<String>) -> Self {
		Self::new(Method::Get, path)
	}

	/// `POST` request.
	pub fn post(path: impl Into<String>) -> Self {
		Self::new(Method::Post, path)
	}

	/// `PUT` request.
	pub fn put(path: impl Into<String>) -> Self {
		Self::new(Method::Put, path)
	}

	/// `PATCH` request.
	pub fn patch(path: impl Into<String>) -> Self {
		Self::new(Method::Patch, path)
	}

	/// `DELETE` request.
	pub fn delete(path: impl Into<String>) -> Self {
		Self::new(Method::Delete, path)
	}

	/// Appends a query parameter.
	pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.query.push((name.into(), value.into()));

		self
	}

	/// Adds or replaces a header; the name is stored lower-case.
	pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
		self.headers.insert(name.as_ref().to_ascii_lowercase(), value.into());

		self
	}

	/// Serializes `body` as the JSON payload.
	pub fn with_json<B>(mut self, body: &B) -> Result<Self, ConfigError>
	where
		B: ?Sized + Serialize,
	{
		self.body = Some(serde_json::to_value(body)?);

		Ok(self)
	}

	/// Sends the request without a bearer credential and returns authorization failures as-is.
	pub fn anonymous(mut self) -> Self {
		self.authenticated = false;

		self
	}

	/// Resolves the description into a transport request, attaching `bearer` when the request
	/// is authenticated.
	pub fn to_http(
		&self,
		config: &ClientConfig,
		bearer: Option<&TokenSecret>,
	) -> Result<HttpRequest, ConfigError> {
		let mut url = config.resolve(&self.path)?;

		if !self.query.is_empty() {
			url.query_pairs_mut().extend_pairs(self.query.iter());
		}

		let mut request = HttpRequest::new(self.method, url).with_header("accept", JSON);

		if let Some(body) = &self.body {
			request = request.with_header("content-type", JSON).with_body(serde_json::to_vec(body)?);
		}
		for (name, value) in &self.headers {
			request = request.with_header(name, value.clone());
		}
		if self.authenticated
			&& let Some(token) = bearer
		{
			request = request.with_header("authorization", token.bearer());
		}

		Ok(request)
	}
}

//! Client configuration: API root, refresh endpoint, and authorization-failure status.

// std
use std::env;
// self
use crate::{_prelude::*, error::ConfigError};

/// Environment variable consulted by [`ClientConfig::from_env`].
pub const BASE_URL_ENV: &str = "SWEETSHOP_API_BASE_URL";
/// API root used when [`BASE_URL_ENV`] is unset.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/api/";
/// Refresh endpoint path relative to the API root.
pub const DEFAULT_REFRESH_PATH: &str = "auth/token/refresh/";
/// Status the backend uses to signal an expired or missing credential.
pub const DEFAULT_UNAUTHORIZED_STATUS: u16 = 401;

/// Validated client configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
	/// API root, always ending with `/`.
	pub base_url: Url,
	/// Fully resolved refresh endpoint.
	pub refresh_url: Url,
	/// Status treated as an authorization failure.
	pub unauthorized_status: u16,
}
impl ClientConfig {
	/// Starts a builder seeded with the defaults.
	pub fn builder() -> ClientConfigBuilder {
		ClientConfigBuilder::default()
	}

	/// Builds a configuration from [`BASE_URL_ENV`], falling back to [`DEFAULT_BASE_URL`].
	pub fn from_env() -> Result<Self, ConfigError> {
		let mut builder = Self::builder();

		if let Ok(base) = env::var(BASE_URL_ENV).map(|v| v.trim().to_owned())
			&& !base.is_empty()
		{
			builder = builder.base_url(base);
		}

		builder.build()
	}

	/// Resolves a request path against the API root.
	///
	/// Leading slashes are stripped so the API root's own path prefix is never discarded.
	pub fn resolve(&self, path: &str) -> Result<Url, ConfigError> {
		let relative = path.trim_start_matches('/');

		self.base_url
			.join(relative)
			.map_err(|source| ConfigError::InvalidPath { path: path.to_owned(), source })
	}

	/// Returns `true` when `status` signals an authorization failure.
	pub fn is_unauthorized(&self, status: u16) -> bool {
		status == self.unauthorized_status
	}
}

/// Builder for [`ClientConfig`] values.
#[derive(Debug)]
pub struct ClientConfigBuilder {
	/// Raw API root.
	pub base_url: String,
	/// Refresh endpoint path relative to the API root.
	pub refresh_path: String,
	/// Status treated as an authorization failure.
	pub unauthorized_status: u16,
}
impl ClientConfigBuilder {
	/// Sets the API root. A trailing `/` is appended when missing.
	pub fn base_url(mut self, url: impl Into<String>) -> Self {
		self.base_url = url.into();

		self
	}

	/// Overrides the refresh endpoint path.
	pub fn refresh_path(mut self, path: impl Into<String>) -> Self {
		self.refresh_path = path.into();

		self
	}

	/// Overrides the status treated as an authorization failure.
	pub fn unauthorized_status(mut self, status: u16) -> Self {
		self.unauthorized_status = status;

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<ClientConfig, ConfigError> {
		let normalized = if self.base_url.ends_with('/') {
			self.base_url
		} else {
			format!("{}/", self.base_url)
		};
		let base_url = Url::parse(&normalized)
			.map_err(|source| ConfigError::InvalidBaseUrl { url: normalized.clone(), source })?;

		if !matches!(base_url.scheme(), "http" | "https") {
			return Err(ConfigError::UnsupportedScheme { scheme: base_url.scheme().to_owned() });
		}
		if !(100..=599).contains(&self.unauthorized_status) {
			return Err(ConfigError::InvalidStatus(self.unauthorized_status));
		}

		let refresh_relative = self.refresh_path.trim_start_matches('/');
		let refresh_url = base_url.join(refresh_relative).map_err(|source| {
			ConfigError::InvalidPath { path: self.refresh_path.clone(), source }
		})?;

		Ok(ClientConfig { base_url, refresh_url, unauthorized_status: self.unauthorized_status })
	}
}
impl Default for ClientConfigBuilder {
	fn default() -> Self {
		Self {
			base_url: DEFAULT_BASE_URL.into(),
			refresh_path: DEFAULT_REFRESH_PATH.into(),
			unauthorized_status: DEFAULT_UNAUTHORIZED_STATUS,
		}
	}
}

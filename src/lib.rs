//! Typed client for the sweetshop storefront API: bearer-token attachment, a singleflight
//! refresh coordinator that collapses concurrent authorization failures into one refresh call,
//! and pluggable session stores shared across client instances.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod api;
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod obs;
pub mod session;
#[cfg(feature = "reqwest")]
#[doc(hidden)]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests and demos; not part of the
	//! supported API.

	pub use crate::_prelude::*;

	// self
	use crate::{
		client::ApiClient,
		config::ClientConfig,
		http::ReqwestHttpClient,
		session::{MemorySessionStore, SessionStore},
	};

	/// Client type alias used by reqwest-backed integration tests.
	pub type ReqwestTestClient = ApiClient<ReqwestHttpClient>;

	/// Builds a [`ClientConfig`] rooted at `base` (usually a mock server URL plus `/api/`).
	pub fn test_config(base: &str) -> ClientConfig {
		ClientConfig::builder()
			.base_url(base)
			.build()
			.expect("Failed to build client configuration for tests.")
	}

	/// Constructs an [`ApiClient`] backed by an in-memory session store and the default reqwest
	/// transport.
	pub fn build_reqwest_test_client(base: &str) -> (ReqwestTestClient, Arc<MemorySessionStore>) {
		let store_backend = Arc::new(MemorySessionStore::default());
		let session: Arc<dyn SessionStore> = store_backend.clone();
		let client = ApiClient::with_transport(
			test_config(base),
			session,
			ReqwestHttpClient::default(),
		);

		(client, store_backend)
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};

//! Typed helpers for the storefront backend endpoints, layered on [`ApiClient`].
//!
//! [`ApiClient`]: crate::client::ApiClient

pub mod auth;
pub mod sweets;

pub use auth::*;
pub use sweets::*;

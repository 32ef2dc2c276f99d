#![cfg(feature = "reqwest")]

// crates.io
use httpmock::prelude::*;
use serde_json::json;
// self
use sweetshop_client::{
	_preludet::*,
	auth::{TokenSecret, TokenUpdate},
	error::RefreshError,
	session::SessionStore,
};

fn sweets_body() -> serde_json::Value {
	json!([
		{ "id": 1, "name": "Nougat", "price": "2.50", "quantity_in_stock": 5 },
		{ "id": 2, "name": "Truffle", "price": "5.00", "quantity_in_stock": 0 }
	])
}

async fn seed(store: &dyn SessionStore, access: &str, refresh: &str) {
	store
		.store_tokens(TokenUpdate {
			access: TokenSecret::new(access),
			refresh: Some(TokenSecret::new(refresh)),
		})
		.await
		.expect("Seeding the session should succeed.");
}

#[tokio::test]
async fn expired_access_is_refreshed_and_request_replayed() {
	let server = MockServer::start_async().await;
	let (client, store) = build_reqwest_test_client(&server.url("/api/"));

	seed(&*store, "access_v1", "refresh_v1").await;

	let stale = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/sweets/").header("authorization", "Bearer access_v1");
			then.status(401).json_body(json!({ "detail": "token_expired" }));
		})
		.await;
	let fresh = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/sweets/").header("authorization", "Bearer access_v2");
			then.status(200).json_body(sweets_body());
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/api/auth/token/refresh/")
				.json_body(json!({ "refresh": "refresh_v1" }));
			then.status(200).json_body(json!({ "access": "access_v2" }));
		})
		.await;
	let sweets = client.list_sweets().await.expect("Replayed request should succeed.");

	assert_eq!(sweets.len(), 2);
	assert_eq!(sweets[0].name, "Nougat");
	assert_eq!(stale.hits_async().await, 1);
	assert_eq!(fresh.hits_async().await, 1);
	assert_eq!(refresh.hits_async().await, 1);

	let snapshot = store.current();

	// The refresh response carried no refresh token, so the old one is kept.
	assert_eq!(snapshot.access_token.as_ref().map(|t| t.expose()), Some("access_v2"));
	assert_eq!(snapshot.refresh_token.as_ref().map(|t| t.expose()), Some("refresh_v1"));
	assert_eq!(client.refresh_metrics.episodes(), 1);
	assert_eq!(client.refresh_metrics.successes(), 1);
	assert_eq!(client.refresh_metrics.replays(), 1);
	assert!(!client.refresh_in_flight());
}

#[tokio::test]
async fn rotated_refresh_token_is_stored() {
	let server = MockServer::start_async().await;
	let (client, store) = build_reqwest_test_client(&server.url("/api/"));

	seed(&*store, "access_v1", "refresh_v1").await;
	server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/token/refresh/");
			then.status(200).json_body(json!({ "access": "access_v2", "refresh": "refresh_v2" }));
		})
		.await;

	let access = client.refresh_access_token().await.expect("Forced refresh should succeed.");

	assert_eq!(access.expose(), "access_v2");
	assert_eq!(store.current().refresh_token.as_ref().map(|t| t.expose()), Some("refresh_v2"));
}

#[tokio::test]
async fn denied_refresh_clears_session_and_surfaces_original_failure() {
	let server = MockServer::start_async().await;
	let (client, store) = build_reqwest_test_client(&server.url("/api/"));

	seed(&*store, "access_v1", "refresh_v1").await;
	store
		.cache_profile(
			serde_json::from_value(json!({ "id": 1, "username": "jdoe" }))
				.expect("Profile fixture should parse."),
		)
		.await
		.expect("Caching the profile should succeed.");

	let sweets = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/sweets/");
			then.status(401).json_body(json!({ "detail": "token_expired" }));
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/token/refresh/");
			then.status(401).json_body(json!({ "detail": "invalid_refresh" }));
		})
		.await;
	let err = client.list_sweets().await.expect_err("Denied refresh should fail the request.");
	let Error::Unauthorized(failure) = &err else {
		panic!("Expected an authorization failure, got {err:?}.");
	};

	assert_eq!(failure.status, 401);
	assert_eq!(failure.detail.as_deref(), Some("token_expired"));
	assert!(matches!(failure.refresh, Some(RefreshError::Denied { status: 401 })));
	assert_eq!(sweets.hits_async().await, 1);
	assert_eq!(refresh.hits_async().await, 1);
	assert!(store.current().is_empty());
	assert_eq!(client.refresh_metrics.failures(), 1);
	assert!(!client.refresh_in_flight());
}

#[tokio::test]
async fn missing_refresh_token_fails_without_refresh_call() {
	let server = MockServer::start_async().await;
	let (client, store) = build_reqwest_test_client(&server.url("/api/"));

	store
		.store_tokens(TokenUpdate::access_only("access_v1"))
		.await
		.expect("Seeding the session should succeed.");

	server
		.mock_async(|when, then| {
			when.method(GET).path("/api/sweets/3/");
			then.status(401).json_body(json!({ "detail": "token_expired" }));
		})
		.await;

	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/token/refresh/");
			then.status(200).json_body(json!({ "access": "access_v2" }));
		})
		.await;
	let err = client.get_sweet(3).await.expect_err("Request without refresh token should fail.");

	assert!(matches!(
		err,
		Error::Unauthorized(ref failure) if matches!(failure.refresh, Some(RefreshError::Unavailable))
	));
	assert_eq!(refresh.hits_async().await, 0);
	assert!(store.current().is_empty());
}

#[tokio::test]
async fn replayed_request_is_never_retried_twice() {
	let server = MockServer::start_async().await;
	let (client, store) = build_reqwest_test_client(&server.url("/api/"));

	seed(&*store, "access_v1", "refresh_v1").await;

	let sweets = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/sweets/");
			then.status(401).json_body(json!({ "detail": "insufficient_permissions" }));
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/token/refresh/");
			then.status(200).json_body(json!({ "access": "access_v2" }));
		})
		.await;
	let err = client.list_sweets().await.expect_err("Second rejection should be returned.");

	assert!(err.is_unauthorized());
	assert_eq!(sweets.hits_async().await, 2);
	assert_eq!(refresh.hits_async().await, 1);
	// The refresh itself succeeded, so the session survives.
	assert_eq!(store.current().access_token.as_ref().map(|t| t.expose()), Some("access_v2"));
}

#[tokio::test]
async fn other_errors_pass_through_without_refresh() {
	let server = MockServer::start_async().await;
	let (client, store) = build_reqwest_test_client(&server.url("/api/"));

	seed(&*store, "access_v1", "refresh_v1").await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/api/sweets/9/");
			then.status(404).json_body(json!({ "detail": "Not found." }));
		})
		.await;

	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/token/refresh/");
			then.status(200).json_body(json!({ "access": "access_v2" }));
		})
		.await;
	let err = client.get_sweet(9).await.expect_err("Missing item should fail.");

	assert!(matches!(err, Error::Status { status: 404, .. }));
	assert_eq!(err.field_errors().non_field_errors(), Some(&["Not found.".to_owned()][..]));
	assert_eq!(refresh.hits_async().await, 0);
	assert_eq!(store.current().access_token.as_ref().map(|t| t.expose()), Some("access_v1"));
}

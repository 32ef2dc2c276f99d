#![cfg(feature = "reqwest")]

// crates.io
use httpmock::prelude::*;
use serde_json::json;
// self
use sweetshop_client::{
	_preludet::*,
	api::{Credentials, Registration},
	auth::{AuthState, Identity},
	session::SessionStore,
};

fn session_body() -> serde_json::Value {
	json!({
		"user": { "id": 1, "username": "jdoe", "email": "jdoe@example.com", "role": "customer" },
		"tokens": { "access": "access_v1", "refresh": "refresh_v1" }
	})
}

#[tokio::test]
async fn login_sends_credentials_and_opens_session() {
	let server = MockServer::start_async().await;
	let (client, store) = build_reqwest_test_client(&server.url("/api/"));
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/api/auth/login/")
				.json_body(json!({ "email": "jdoe@example.com", "password": "pass123" }));
			then.status(200).json_body(session_body());
		})
		.await;
	let opened = client
		.login(&Credentials::new("jdoe@example.com", "pass123"))
		.await
		.expect("Login should succeed.");

	mock.assert_async().await;

	assert_eq!(opened.tokens.access.expose(), "access_v1");
	assert_eq!(opened.user.as_ref().and_then(|user| user.username.as_deref()), Some("jdoe"));

	let snapshot = store.current();

	assert_eq!(snapshot.access_token.as_ref().map(|t| t.expose()), Some("access_v1"));
	assert_eq!(snapshot.refresh_token.as_ref().map(|t| t.expose()), Some("refresh_v1"));
	assert_eq!(snapshot.user_profile, opened.user);
}

#[tokio::test]
async fn register_sends_username_payload() {
	let server = MockServer::start_async().await;
	let (client, store) = build_reqwest_test_client(&server.url("/api/"));
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/register/").json_body(json!({
				"username": "newbie",
				"email": "newbie@example.com",
				"password": "StrongPass!1"
			}));
			then.status(201).json_body(session_body());
		})
		.await;

	client
		.register(&Registration::new("newbie", "newbie@example.com", "StrongPass!1"))
		.await
		.expect("Registration should succeed.");
	mock.assert_async().await;

	assert_eq!(store.current().access_token.as_ref().map(|t| t.expose()), Some("access_v1"));
}

#[tokio::test]
async fn rejected_login_never_refreshes() {
	let server = MockServer::start_async().await;
	let (client, store) = build_reqwest_test_client(&server.url("/api/"));
	let login = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/login/");
			then.status(401).json_body(json!({ "detail": "No active account found." }));
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/token/refresh/");
			then.status(200).json_body(json!({ "access": "access_v2" }));
		})
		.await;
	let err = client
		.login(&Credentials::new("jdoe@example.com", "wrong"))
		.await
		.expect_err("Bad credentials should be rejected.");

	assert!(err.is_unauthorized());
	assert_eq!(
		err.field_errors().non_field_errors(),
		Some(&["No active account found.".to_owned()][..])
	);
	assert_eq!(login.hits_async().await, 1);
	assert_eq!(refresh.hits_async().await, 0);
	assert_eq!(client.refresh_metrics.episodes(), 0);
	assert!(store.current().is_empty());
}

#[tokio::test]
async fn registration_validation_errors_are_structured() {
	let server = MockServer::start_async().await;
	let (client, store) = build_reqwest_test_client(&server.url("/api/"));

	server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/register/");
			then.status(400).json_body(json!({
				"email": ["user with this email already exists."],
				"password": "This password is too short."
			}));
		})
		.await;

	let err = client
		.register(&Registration::new("jdoe", "jdoe@example.com", "short"))
		.await
		.expect_err("Duplicate registration should be rejected.");
	let errors = err.field_errors();

	assert!(matches!(err, Error::Validation(_)));
	assert_eq!(errors.get("email"), Some(&["user with this email already exists.".to_owned()][..]));
	assert_eq!(errors.get("password"), Some(&["This password is too short.".to_owned()][..]));
	assert!(store.current().is_empty());
}

#[tokio::test]
async fn auth_state_tracks_login_and_logout() {
	let server = MockServer::start_async().await;
	let (client, store) = build_reqwest_test_client(&server.url("/api/"));

	server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/login/");
			then.status(200).json_body(json!({
				"user": { "id": 2, "username": "admin", "role": "admin" },
				"tokens": { "access": "access_v1", "refresh": "refresh_v1" }
			}));
		})
		.await;

	let state = AuthState::load(&*store).await.expect("Loading auth state should succeed.");

	assert!(!state.is_authenticated());

	let identity = state
		.login(&client, &Credentials::new("admin@example.com", "pass123"))
		.await
		.expect("Login should succeed.");

	assert!(matches!(identity, Some(Identity::Profile(_))));
	assert!(state.is_admin());

	// A second holder of the same session observes the logout.
	let observer = AuthState::load(client.session.as_ref())
		.await
		.expect("Loading a second auth state should succeed.");

	assert!(observer.is_authenticated());

	state.logout(&client).await.expect("Logout should succeed.");

	assert!(!state.is_authenticated());
	assert!(!observer.is_authenticated());
	assert!(
		client.session.snapshot().await.expect("Snapshot should be readable.").is_empty()
	);
}

#[tokio::test]
async fn login_then_browse_sends_issued_bearer() {
	let server = MockServer::start_async().await;
	let (client, _store) = build_reqwest_test_client(&server.url("/api/"));

	server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/login/");
			then.status(200).json_body(session_body());
		})
		.await;

	let sweets = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/sweets/").header("authorization", "Bearer access_v1");
			then.status(200).json_body(json!([
				{ "id": 1, "name": "Nougat", "price": "2.50", "quantity_in_stock": 5 }
			]));
		})
		.await;

	client
		.login(&Credentials::new("jdoe@example.com", "pass123"))
		.await
		.expect("Login should succeed.");

	let listed = client.list_sweets().await.expect("Listing after login should succeed.");

	sweets.assert_async().await;

	assert_eq!(listed.len(), 1);
	assert_eq!(client.refresh_metrics.episodes(), 0);
}

#[tokio::test]
async fn login_accepts_profile_without_numeric_id() {
	let server = MockServer::start_async().await;
	let (client, store) = build_reqwest_test_client(&server.url("/api/"));

	server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/login/");
			then.status(200).json_body(json!({
				"user": { "username": "jdoe", "email": "jdoe@example.com" },
				"tokens": { "access": "access_v1", "refresh": "refresh_v1" }
			}));
		})
		.await;

	let opened = client
		.login(&Credentials::new("jdoe@example.com", "pass123"))
		.await
		.expect("Login should succeed without a user id.");
	let user = opened.user.expect("The profile should be returned.");

	assert_eq!(user.id, None);
	assert_eq!(user.username.as_deref(), Some("jdoe"));
	assert_eq!(store.current().user_profile, Some(user));
}

//! Fires a burst of requests with an expired access token and shows that the whole burst is
//! recovered by a single refresh call.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use serde_json::json;
// self
use sweetshop_client::{
	client::ReqwestApiClient,
	config::ClientConfig,
	session::{MemorySessionStore, SessionStore},
};

const BURST: usize = 16;

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/api/sweets/").header("authorization", "Bearer expired-access");
			then.status(401).json_body(json!({ "detail": "token_expired" }));
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/api/sweets/").header("authorization", "Bearer fresh-access");
			then.status(200).json_body(json!([]));
		})
		.await;

	let refresh_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/token/refresh/");
			then.status(200)
				.delay(std::time::Duration::from_millis(200))
				.json_body(json!({ "access": "fresh-access" }));
		})
		.await;
	let session: Arc<dyn SessionStore> =
		Arc::new(MemorySessionStore::with_tokens("expired-access", "demo-refresh"));
	let config = ClientConfig::builder().base_url(server.url("/api/")).build()?;
	let client = ReqwestApiClient::new(config, session);
	let tasks = (0..BURST)
		.map(|_| {
			let client = client.clone();

			tokio::spawn(async move { client.list_sweets().await })
		})
		.collect::<Vec<_>>();

	for task in tasks {
		task.await??;
	}

	let metrics = &client.refresh_metrics;

	println!(
		"{BURST} requests, {} refresh call(s), {} waiter(s), {} reused token(s), {} replay(s).",
		refresh_mock.hits_async().await,
		metrics.waiters(),
		metrics.reused(),
		metrics.replays(),
	);

	Ok(())
}

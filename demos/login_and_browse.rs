//! Signs in against a mock storefront, browses the catalogue, and buys an item using the
//! default reqwest transport and an in-memory session store.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use serde_json::json;
// self
use sweetshop_client::{
	api::{Category, Credentials, SearchQuery},
	auth::AuthState,
	client::ReqwestApiClient,
	config::ClientConfig,
	session::{MemorySessionStore, SessionStore},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let login_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/login/");
			then.status(200).json_body(json!({
				"user": { "id": 1, "username": "jdoe", "email": "jdoe@example.com", "role": "customer" },
				"tokens": { "access": "demo-access", "refresh": "demo-refresh" }
			}));
		})
		.await;

	server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/api/sweets/search/")
				.header("authorization", "Bearer demo-access");
			then.status(200).json_body(json!([
				{ "id": 7, "name": "Dark Truffle", "category": "chocolate", "price": "5.00", "quantity_in_stock": 12 }
			]));
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(POST).path("/api/sweets/7/purchase/");
			then.status(200).json_body(json!({
				"id": 7, "name": "Dark Truffle", "category": "chocolate", "price": "5.00", "quantity_in_stock": 10
			}));
		})
		.await;

	let session: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::default());
	let config = ClientConfig::builder().base_url(server.url("/api/")).build()?;
	let client = ReqwestApiClient::new(config, session.clone());
	let auth = AuthState::load(session.as_ref()).await?;
	let identity = auth.login(&client, &Credentials::new("jdoe@example.com", "pass123")).await?;

	println!(
		"Signed in as {} (admin: {}).",
		identity.as_ref().and_then(|identity| identity.username()).unwrap_or("unknown"),
		auth.is_admin()
	);

	let truffles =
		client.search_sweets(&SearchQuery::default().category(Category::Chocolate)).await?;

	for sweet in &truffles {
		println!("{} costs {} ({} left).", sweet.name, sweet.price, sweet.quantity_in_stock);
	}
	if let Some(sweet) = truffles.first() {
		let after = client.purchase_sweet(sweet.id, 2).await?;

		println!("Bought two; {} left.", after.quantity_in_stock);
	}

	login_mock.assert_async().await;

	Ok(())
}

//! Sweets inventory endpoints.

// self
use crate::{
	_prelude::*,
	client::{ApiClient, ApiRequest},
	http::HttpTransport,
};

const SWEETS_PATH: &str = "sweets/";
const SEARCH_PATH: &str = "sweets/search/";

/// Catalogue categories offered by the storefront.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
	/// Chocolate bars and truffles.
	Chocolate,
	/// Hard and soft candy.
	Candy,
	/// Baked goods.
	Bakery,
	/// Chewing gum.
	Gum,
	/// Anything else.
	Other,
}
impl Category {
	/// Every category, in display order.
	pub const ALL: [Category; 5] =
		[Category::Chocolate, Category::Candy, Category::Bakery, Category::Gum, Category::Other];

	/// Returns the wire value.
	pub const fn as_str(self) -> &'static str {
		match self {
			Category::Chocolate => "chocolate",
			Category::Candy => "candy",
			Category::Bakery => "bakery",
			Category::Gum => "gum",
			Category::Other => "other",
		}
	}

	/// Returns the human-readable label.
	pub const fn label(self) -> &'static str {
		match self {
			Category::Chocolate => "Chocolate",
			Category::Candy => "Candy",
			Category::Bakery => "Bakery",
			Category::Gum => "Gum",
			Category::Other => "Other",
		}
	}
}
impl Display for Category {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for Category {
	type Err = DraftError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Category::ALL
			.into_iter()
			.find(|category| category.as_str().eq_ignore_ascii_case(s.trim()))
			.ok_or_else(|| DraftError::UnknownCategory { value: s.to_owned() })
	}
}

/// Errors raised while building a [`SweetDraft`] locally, before anything is sent.
#[derive(Clone, Debug, PartialEq, ThisError)]
pub enum DraftError {
	/// The name is empty after trimming.
	#[error("Name is required.")]
	MissingName,
	/// The price is not a positive finite number.
	#[error("Price must be a positive number, got {price}.")]
	InvalidPrice {
		/// Rejected price.
		price: f64,
	},
	/// The category is not one of the storefront categories.
	#[error("Unknown category `{value}`.")]
	UnknownCategory {
		/// Rejected value.
		value: String,
	},
}

/// Inventory item as returned by the backend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sweet {
	/// Backend identifier.
	pub id: u64,
	/// Display name.
	pub name: String,
	/// Category wire value; kept as text so new backend categories still decode.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub category: Option<String>,
	/// Decimal price as sent by the backend (for example `"2.50"`).
	pub price: String,
	/// Units available for purchase.
	#[serde(default)]
	pub quantity_in_stock: u32,
	/// Optional description.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	/// Any other fields, preserved verbatim.
	#[serde(flatten)]
	pub extra: serde_json::Map<String, serde_json::Value>,
}
impl Sweet {
	/// Returns `true` when no units are left.
	pub fn is_sold_out(&self) -> bool {
		self.quantity_in_stock == 0
	}

	/// Parses the category wire value, if it is a known one.
	pub fn known_category(&self) -> Option<Category> {
		self.category.as_deref().and_then(|value| value.parse().ok())
	}
}

/// Validated payload for creating an item.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SweetDraft {
	name: String,
	category: Category,
	price: String,
	quantity_in_stock: u32,
	#[serde(skip_serializing_if = "Option::is_none")]
	description: Option<String>,
}
impl SweetDraft {
	/// Validates and normalizes a new item.
	///
	/// Name and description are trimmed, an empty description is dropped, and the price is
	/// formatted with two decimals.
	pub fn new(
		name: &str,
		category: Category,
		price: f64,
		quantity_in_stock: u32,
		description: Option<&str>,
	) -> Result<Self, DraftError> {
		let name = name.trim();

		if name.is_empty() {
			return Err(DraftError::MissingName);
		}

		Ok(Self {
			name: name.to_owned(),
			category,
			price: format_price(price)?,
			quantity_in_stock,
			description: description.map(str::trim).filter(|d| !d.is_empty()).map(str::to_owned),
		})
	}

	/// Normalized name.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Two-decimal price string.
	pub fn price(&self) -> &str {
		&self.price
	}
}

/// Partial update; only the fields that are set are sent.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SweetPatch {
	/// New name.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	/// New category.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub category: Option<Category>,
	/// New two-decimal price string.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub price: Option<String>,
	/// New stock level.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub quantity_in_stock: Option<u32>,
	/// New description.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
}
impl SweetPatch {
	/// Sets the name (trimmed).
	pub fn name(mut self, name: &str) -> Result<Self, DraftError> {
		let name = name.trim();

		if name.is_empty() {
			return Err(DraftError::MissingName);
		}

		self.name = Some(name.to_owned());

		Ok(self)
	}

	/// Sets the category.
	pub fn category(mut self, category: Category) -> Self {
		self.category = Some(category);

		self
	}

	/// Sets the price, formatted with two decimals.
	pub fn price(mut self, price: f64) -> Result<Self, DraftError> {
		self.price = Some(format_price(price)?);

		Ok(self)
	}

	/// Sets the stock level.
	pub fn quantity_in_stock(mut self, quantity: u32) -> Self {
		self.quantity_in_stock = Some(quantity);

		self
	}

	/// Sets the description (trimmed).
	pub fn description(mut self, description: &str) -> Self {
		self.description = Some(description.trim().to_owned());

		self
	}

	/// Returns `true` when no field is set.
	pub fn is_empty(&self) -> bool {
		self == &Self::default()
	}
}

/// Query filters for listing and search; unset filters are not sent.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SearchQuery {
	/// Name substring.
	pub name: Option<String>,
	/// Category.
	pub category: Option<Category>,
	/// Lower price bound.
	pub min_price: Option<f64>,
	/// Upper price bound.
	pub max_price: Option<f64>,
	/// Additional backend parameters (pagination, ordering), sent verbatim.
	pub params: BTreeMap<String, String>,
}
impl SearchQuery {
	/// Filters by name substring.
	pub fn name(mut self, name: impl Into<String>) -> Self {
		self.name = Some(name.into());

		self
	}

	/// Filters by category.
	pub fn category(mut self, category: Category) -> Self {
		self.category = Some(category);

		self
	}

	/// Sets the inclusive price range bounds.
	pub fn price_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
		self.min_price = min;
		self.max_price = max;

		self
	}

	/// Adds a raw query parameter, replacing any earlier value for `key`.
	pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.params.insert(key.into(), value.into());

		self
	}

	fn apply(&self, mut request: ApiRequest) -> ApiRequest {
		if let Some(name) = self.name.as_deref().filter(|name| !name.is_empty()) {
			request = request.with_query("name", name);
		}
		if let Some(category) = self.category {
			request = request.with_query("category", category.as_str());
		}
		if let Some(min) = self.min_price {
			request = request.with_query("min_price", min.to_string());
		}
		if let Some(max) = self.max_price {
			request = request.with_query("max_price", max.to_string());
		}
		for (key, value) in &self.params {
			request = request.with_query(key.as_str(), value.as_str());
		}

		request
	}
}

#[derive(Serialize)]
struct StockChange {
	quantity: u32,
}

impl<T> ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Lists every item.
	pub async fn list_sweets(&self) -> Result<Vec<Sweet>> {
		self.list_sweets_with(&SearchQuery::default()).await
	}

	/// Lists items, forwarding the set filters and raw parameters as the query string.
	pub async fn list_sweets_with(&self, query: &SearchQuery) -> Result<Vec<Sweet>> {
		self.send_json(query.apply(ApiRequest::get(SWEETS_PATH))).await
	}

	/// Fetches one item.
	pub async fn get_sweet(&self, id: u64) -> Result<Sweet> {
		self.send_json(ApiRequest::get(item_path(id))).await
	}

	/// Creates an item (admin only on the backend).
	pub async fn create_sweet(&self, draft: &SweetDraft) -> Result<Sweet> {
		self.send_json(ApiRequest::post(SWEETS_PATH).with_json(draft)?).await
	}

	/// Applies a partial update (admin only on the backend).
	pub async fn update_sweet(&self, id: u64, patch: &SweetPatch) -> Result<Sweet> {
		self.send_json(ApiRequest::patch(item_path(id)).with_json(patch)?).await
	}

	/// Deletes an item (admin only on the backend).
	pub async fn delete_sweet(&self, id: u64) -> Result<()> {
		self.send(ApiRequest::delete(item_path(id))).await?;

		Ok(())
	}

	/// Searches the catalogue.
	pub async fn search_sweets(&self, query: &SearchQuery) -> Result<Vec<Sweet>> {
		self.send_json(query.apply(ApiRequest::get(SEARCH_PATH))).await
	}

	/// Buys `quantity` units and returns the updated item.
	pub async fn purchase_sweet(&self, id: u64, quantity: u32) -> Result<Sweet> {
		self.change_stock(id, "purchase", quantity).await
	}

	/// Adds `quantity` units (admin only on the backend) and returns the updated item.
	pub async fn restock_sweet(&self, id: u64, quantity: u32) -> Result<Sweet> {
		self.change_stock(id, "restock", quantity).await
	}

	async fn change_stock(&self, id: u64, action: &str, quantity: u32) -> Result<Sweet> {
		let request = ApiRequest::post(format!("{}{action}/", item_path(id)))
			.with_json(&StockChange { quantity })?;

		self.send_json(request).await
	}
}

fn item_path(id: u64) -> String {
	format!("{SWEETS_PATH}{id}/")
}

fn format_price(price: f64) -> Result<String, DraftError> {
	if !price.is_finite() || price <= 0. {
		return Err(DraftError::InvalidPrice { price });
	}

	Ok(format!("{price:.2}"))
}

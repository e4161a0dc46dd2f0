//! Client for sites consuming the public feed
//!
//! Mirrors what the storefront integration does: poll the catalog, keep a
//! cart, and confirm each cart line with the stock-check endpoint at checkout.
//! Checkout stops at the first rejected line; lines confirmed before it are
//! reported back, nothing is rolled back.

use crate::catalog::{AvailabilityStatus, ProductView};
use crate::stock_check::{CustomerInfo, ProductSnapshot, StockCheckRequest, StockCheckResponse};
use crate::web::FeedResponse;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// How often consumers should refresh the catalog
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Error)]
pub enum StorefrontError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    /// Server answered with `success: false`
    #[error("Request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },
}

/// Checkout aborted part-way
#[derive(Debug, Error)]
#[error("Checkout stopped at product {product_id}: {source}")]
pub struct CheckoutError {
    pub product_id: String,
    /// Lines confirmed before the failure, in cart order
    pub confirmed: Vec<ProductSnapshot>,
    #[source]
    pub source: StorefrontError,
}

#[derive(Deserialize)]
struct FailureBody {
    #[serde(default)]
    error: Option<String>,
}

/// HTTP client for one feed server
#[derive(Clone)]
pub struct StorefrontClient {
    client: reqwest::Client,
    base_url: String,
}

impl StorefrontClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// GET /api/products
    pub async fn fetch_products(&self) -> Result<Vec<ProductView>, StorefrontError> {
        let response = self
            .client
            .get(format!("{}/api/products", self.base_url))
            .header("User-Agent", "nursery_feed-storefront/1.0")
            .send()
            .await?;

        let feed: FeedResponse = Self::parse(response).await?;
        log::debug!("Fetched {} products from feed", feed.total_count);
        Ok(feed.products)
    }

    /// POST /api/update-inventory for a single cart line
    pub async fn check_stock(
        &self,
        line: &CartLine,
        customer: &CustomerInfo,
    ) -> Result<ProductSnapshot, StorefrontError> {
        let request = StockCheckRequest {
            product_id: Some(line.product_id.clone()),
            quantity_sold: Some(line.quantity as f64),
            customer_info: Some(customer.clone()),
        };

        let response = self
            .client
            .post(format!("{}/api/update-inventory", self.base_url))
            .json(&request)
            .send()
            .await?;

        let confirmed: StockCheckResponse = Self::parse(response).await?;
        Ok(confirmed.product)
    }

    /// Confirm every cart line in order, stopping at the first failure
    pub async fn checkout(
        &self,
        cart: &Cart,
        customer: &CustomerInfo,
    ) -> Result<Vec<ProductSnapshot>, CheckoutError> {
        let mut confirmed = Vec::with_capacity(cart.len());

        for line in cart.lines() {
            match self.check_stock(line, customer).await {
                Ok(snapshot) => confirmed.push(snapshot),
                Err(source) => {
                    log::warn!(
                        "Checkout failed at {} after {} confirmed line(s): {}",
                        line.product_id,
                        confirmed.len(),
                        source
                    );
                    return Err(CheckoutError {
                        product_id: line.product_id.clone(),
                        confirmed,
                        source,
                    });
                }
            }
        }

        Ok(confirmed)
    }

    async fn parse<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, StorefrontError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        let message = response
            .json::<FailureBody>()
            .await
            .ok()
            .and_then(|body| body.error)
            .unwrap_or_else(|| status.to_string());
        Err(StorefrontError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

/// One product in the cart
#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    pub product_id: String,
    pub name: String,
    pub unit_price: f64,
    pub quantity: u64,
}

/// Client-side shopping cart
#[derive(Debug, Clone, Default)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `quantity` of a product, capped at what the feed reports in stock
    ///
    /// Products labelled "Not Available" are not offered. Returns the
    /// product's quantity in the cart afterwards.
    pub fn add(&mut self, product: &ProductView, quantity: u64) -> u64 {
        if product.availability_status == AvailabilityStatus::NotAvailable {
            return 0;
        }

        match self.lines.iter_mut().find(|l| l.product_id == product.id) {
            Some(line) => {
                line.quantity = line.quantity.saturating_add(quantity).min(product.quantity);
                line.quantity
            }
            None => {
                let quantity = quantity.min(product.quantity);
                if quantity > 0 {
                    self.lines.push(CartLine {
                        product_id: product.id.clone(),
                        name: product.plant_name.clone(),
                        unit_price: product.price,
                        quantity,
                    });
                }
                quantity
            }
        }
    }

    /// Remove a product; returns whether it was in the cart
    pub fn remove(&mut self, product_id: &str) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| l.product_id != product_id);
        self.lines.len() != before
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.lines
            .iter()
            .map(|l| l.unit_price * l.quantity as f64)
            .sum()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn product(id: &str, quantity: u64, price: f64) -> ProductView {
        ProductView {
            id: id.to_string(),
            plant_name: format!("Plant {}", id),
            scientific_name: String::new(),
            category: "Fruit Trees".to_string(),
            description: String::new(),
            image_url: crate::catalog::PLACEHOLDER_IMAGE.to_string(),
            sku: String::new(),
            item_type: String::new(),
            unit: "seedlings".to_string(),
            age: String::new(),
            quantity,
            price,
            availability_status: crate::catalog::availability_status(quantity, false),
            ready_for_sale: true,
            updated_at: String::new(),
        }
    }

    #[test]
    fn cart_caps_quantity_at_stock() {
        let mut cart = Cart::new();
        assert_eq!(cart.add(&product("1", 50, 100.0), 30), 30);
        assert_eq!(cart.add(&product("1", 50, 100.0), 40), 50);
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.total(), 5000.0);
    }

    #[test]
    fn cart_add_does_not_overflow() {
        let mut cart = Cart::new();
        let stocked = product("1", u64::MAX, 1.0);
        assert_eq!(cart.add(&stocked, u64::MAX - 1), u64::MAX - 1);
        assert_eq!(cart.add(&stocked, u64::MAX), u64::MAX);
        assert_eq!(cart.len(), 1);
    }

    #[test]
    fn cart_skips_unavailable_products() {
        let mut cart = Cart::new();
        assert_eq!(cart.add(&product("1", 0, 100.0), 2), 0);
        // 5 seedlings is below the plant threshold
        assert_eq!(cart.add(&product("2", 5, 100.0), 2), 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn cart_remove_and_clear() {
        let mut cart = Cart::new();
        cart.add(&product("1", 50, 10.0), 1);
        cart.add(&product("2", 50, 20.0), 2);
        assert!(cart.remove("1"));
        assert!(!cart.remove("1"));
        assert_eq!(cart.total(), 40.0);
        cart.clear();
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn fetch_products_parses_feed() {
        let mock_server = MockServer::start().await;
        let client = StorefrontClient::new(&mock_server.uri());

        Mock::given(method("GET"))
            .and(path("/api/products"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "total_count": 1,
                "products": [product("1", 45, 1200.0)]
            })))
            .mount(&mock_server)
            .await;

        let products = client.fetch_products().await.unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].availability_status, AvailabilityStatus::Limited);
    }

    #[tokio::test]
    async fn fetch_products_surfaces_rate_limit() {
        let mock_server = MockServer::start().await;
        let client = StorefrontClient::new(&mock_server.uri());

        Mock::given(method("GET"))
            .and(path("/api/products"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "success": false,
                "error": "Too many requests"
            })))
            .mount(&mock_server)
            .await;

        match client.fetch_products().await {
            Err(StorefrontError::Rejected { status, message }) => {
                assert_eq!(status, 429);
                assert_eq!(message, "Too many requests");
            }
            other => panic!("expected rejection, got {:?}", other.map(|p| p.len())),
        }
    }

    #[tokio::test]
    async fn checkout_stops_at_first_failure() {
        let mock_server = MockServer::start().await;
        let client = StorefrontClient::new(&mock_server.uri());

        Mock::given(method("POST"))
            .and(path("/api/update-inventory"))
            .and(body_partial_json(serde_json::json!({ "product_id": "1" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "message": "ok",
                "product": { "id": "1", "name": "Plant 1", "available_quantity": 5, "price": 10.0 }
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/api/update-inventory"))
            .and(body_partial_json(serde_json::json!({ "product_id": "2" })))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "success": false,
                "error": "Insufficient stock. Only 1 available"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/api/update-inventory"))
            .and(body_partial_json(serde_json::json!({ "product_id": "3" })))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let mut cart = Cart::new();
        cart.add(&product("1", 50, 10.0), 2);
        cart.add(&product("2", 50, 20.0), 3);
        cart.add(&product("3", 50, 30.0), 1);

        let err = client
            .checkout(&cart, &CustomerInfo::default())
            .await
            .unwrap_err();
        assert_eq!(err.product_id, "2");
        assert_eq!(err.confirmed.len(), 1);
        assert_eq!(err.confirmed[0].id, "1");
        assert_eq!(err.confirmed[0].available_quantity, 5);
        assert!(matches!(
            err.source,
            StorefrontError::Rejected { status: 400, .. }
        ));
    }
}

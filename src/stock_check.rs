//! Stock check behind `POST /api/update-inventory`
//!
//! Despite the route name this never changes the stored quantity: it confirms
//! the requested amount is on hand and returns a snapshot of the product.
//! Stock is only adjusted through the dashboard.

use crate::error::ApiError;
use crate::store::{lenient_number, opaque_id, InventoryRow, InventoryStore};
use serde::{Deserialize, Serialize};

/// Buyer details sent along with a checkout line (logged, never stored)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Request body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StockCheckRequest {
    #[serde(default, deserialize_with = "opaque_id")]
    pub product_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub quantity_sold: Option<f64>,
    #[serde(default)]
    pub customer_info: Option<CustomerInfo>,
}

/// Product state at the time of the check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub id: String,
    pub name: String,
    /// Whole units on hand, never negative
    pub available_quantity: u64,
    pub price: f64,
}

/// Successful response body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockCheckResponse {
    pub success: bool,
    pub message: String,
    pub product: ProductSnapshot,
}

/// Validated request: a product id and a positive quantity
#[derive(Debug, Clone, PartialEq)]
pub struct StockCheck<'a> {
    pub product_id: &'a str,
    pub quantity: f64,
}

impl StockCheckRequest {
    pub fn validate(&self) -> Result<StockCheck<'_>, ApiError> {
        let product_id = self
            .product_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| ApiError::Validation("product_id is required".to_string()))?;

        let quantity = match self.quantity_sold {
            Some(q) if q.is_finite() && q > 0.0 => q,
            Some(_) => {
                return Err(ApiError::Validation(
                    "quantity_sold must be greater than 0".to_string(),
                ))
            }
            None => return Err(ApiError::Validation("quantity_sold is required".to_string())),
        };

        Ok(StockCheck {
            product_id,
            quantity,
        })
    }
}

/// Compare a requested quantity with the row's stock
pub fn evaluate(row: &InventoryRow, check: &StockCheck<'_>) -> Result<ProductSnapshot, ApiError> {
    let available = row.quantity.unwrap_or(0.0);
    if available < check.quantity {
        return Err(ApiError::Validation(format!(
            "Insufficient stock. Only {} available",
            available
        )));
    }

    Ok(ProductSnapshot {
        id: row
            .id
            .clone()
            .unwrap_or_else(|| check.product_id.to_string()),
        name: row.plant_name.clone().unwrap_or_default(),
        available_quantity: available.max(0.0).trunc() as u64,
        price: row.price.unwrap_or(0.0),
    })
}

/// Validate a request against the live row; read-only
pub async fn check_stock(
    store: &dyn InventoryStore,
    request: &StockCheckRequest,
) -> Result<StockCheckResponse, ApiError> {
    let check = request.validate()?;

    let row = store
        .find_by_id(check.product_id)
        .await
        .map_err(|e| {
            log::error!("Stock check lookup failed for {}: {}", check.product_id, e);
            ApiError::upstream("Failed to check inventory")
        })?
        .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))?;

    let product = evaluate(&row, &check).inspect_err(|e| {
        log::warn!("Stock check rejected for {}: {}", check.product_id, e);
    })?;

    if let Some(customer) = &request.customer_info {
        log::info!(
            "Stock check passed for {} x{} (customer: {})",
            check.product_id,
            check.quantity,
            customer.name.as_deref().unwrap_or("anonymous")
        );
    }

    Ok(StockCheckResponse {
        success: true,
        message: format!(
            "Stock confirmed for {}: {} requested, {} available. Inventory was not modified.",
            product.name, check.quantity, product.available_quantity
        ),
        product,
    })
}

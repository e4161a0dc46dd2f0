//! Public product feed pipeline
//!
//! Turns raw inventory rows into the sanitized [`ProductView`]s served on
//! `/api/products`. Everything here is pure; the handler only adds I/O.

use crate::store::InventoryRow;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Image shown when a row has no picture
pub const PLACEHOLDER_IMAGE: &str = "/images/placeholder.svg";

const HONEY_ITEM_TYPE: &str = "Honey";
const HONEY_CATEGORY: &str = "Organic Honey";

lazy_static! {
    static ref SCRIPT_BLOCK: Regex = Regex::new(r"(?is)<script\b.*?</script\s*>").unwrap();
}

/// Stock label shown to shoppers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AvailabilityStatus {
    Available,
    Limited,
    #[serde(rename = "Not Available")]
    NotAvailable,
}

/// Sanitized product as exposed to the storefront
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductView {
    pub id: String,
    pub plant_name: String,
    pub scientific_name: String,
    pub category: String,
    pub description: String,
    pub image_url: String,
    pub sku: String,
    pub item_type: String,
    pub unit: String,
    pub age: String,
    pub quantity: u64,
    pub price: f64,
    pub availability_status: AvailabilityStatus,
    pub ready_for_sale: bool,
    pub updated_at: String,
}

/// Strip `<script>` blocks, then any remaining angle brackets, then trim.
///
/// Idempotent: the output never contains `<` or `>`.
pub fn sanitize_text(input: &str) -> String {
    let without_scripts = SCRIPT_BLOCK.replace_all(input, "");
    without_scripts
        .chars()
        .filter(|c| *c != '<' && *c != '>')
        .collect::<String>()
        .trim()
        .to_string()
}

/// Honey rows are identified by item type or by their category
pub fn is_honey(item_type: Option<&str>, category: Option<&str>) -> bool {
    item_type == Some(HONEY_ITEM_TYPE) || category == Some(HONEY_CATEGORY)
}

/// Availability label for a stock level
///
/// Honey sells by the kilo, so smaller quantities already count as available.
pub fn availability_status(quantity: u64, honey: bool) -> AvailabilityStatus {
    match (honey, quantity) {
        (false, q) if q >= 100 => AvailabilityStatus::Available,
        (false, q) if q >= 10 => AvailabilityStatus::Limited,
        (true, q) if q >= 10 => AvailabilityStatus::Available,
        (true, q) if q >= 1 => AvailabilityStatus::Limited,
        _ => AvailabilityStatus::NotAvailable,
    }
}

/// Rows missing an id or name, or with a missing/negative quantity or price,
/// are not fit for the public feed.
pub fn is_valid_row(row: &InventoryRow) -> bool {
    let quantity_ok = matches!(row.quantity, Some(q) if q.is_finite() && q >= 0.0);
    let price_ok = matches!(row.price, Some(p) if p.is_finite() && p >= 0.0);
    row.id.is_some() && row.plant_name.is_some() && quantity_ok && price_ok
}

fn clean(value: Option<&str>) -> String {
    value.map(sanitize_text).unwrap_or_default()
}

/// Non-negative, finite number; anything else becomes 0
fn non_negative(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => v,
        _ => 0.0,
    }
}

fn default_description(name: &str, age: &str, honey: bool) -> String {
    if honey {
        if age.is_empty() {
            format!("Pure natural {} honey. Harvested and packed at our nursery.", name)
        } else {
            format!(
                "Pure natural {} honey, aged {}. Harvested and packed at our nursery.",
                name, age
            )
        }
    } else {
        format!(
            "Healthy {} seedlings, nursery-raised and ready for planting.",
            name
        )
    }
}

/// Build the public view of a row (callers filter with [`is_valid_row`] first)
pub fn to_product_view(row: &InventoryRow) -> ProductView {
    let plant_name = clean(row.plant_name.as_deref());
    let category = clean(row.category.as_deref());
    let item_type = clean(row.item_type.as_deref());
    let age = clean(row.age.as_deref());
    let honey = is_honey(Some(item_type.as_str()), Some(category.as_str()));

    let quantity = non_negative(row.quantity).trunc() as u64;

    let unit = match clean(row.unit.as_deref()) {
        unit if !unit.is_empty() => unit,
        _ if honey => "kg".to_string(),
        _ => "seedlings".to_string(),
    };

    let description = match clean(row.description.as_deref()) {
        description if !description.is_empty() => description,
        _ => default_description(&plant_name, &age, honey),
    };

    let image_url = match clean(row.image_url.as_deref()) {
        url if !url.is_empty() => url,
        _ => PLACEHOLDER_IMAGE.to_string(),
    };

    ProductView {
        id: clean(row.id.as_deref()),
        scientific_name: clean(row.scientific_name.as_deref()),
        sku: clean(row.sku.as_deref()),
        updated_at: clean(row.updated_at.as_deref()),
        price: non_negative(row.price),
        availability_status: availability_status(quantity, honey),
        ready_for_sale: row.ready_for_sale.unwrap_or(false),
        plant_name,
        category,
        item_type,
        unit,
        age,
        quantity,
        description,
        image_url,
    }
}

/// Validate and sanitize a batch of rows; invalid rows are dropped silently.
///
/// Rows whose name sanitizes to nothing are dropped as well.
pub fn build_feed(rows: &[InventoryRow]) -> Vec<ProductView> {
    let products: Vec<ProductView> = rows
        .iter()
        .filter(|row| is_valid_row(row))
        .map(to_product_view)
        .filter(|product| !product.plant_name.is_empty())
        .collect();

    let dropped = rows.len() - products.len();
    if dropped > 0 {
        log::debug!("Dropped {} invalid inventory rows from feed", dropped);
    }
    products
}

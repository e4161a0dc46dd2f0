//! Inventory store access
//!
//! The inventory table is owned by the hosted database; this service only reads it.
//! Handlers talk to the [`InventoryStore`] trait so the production PostgREST backend
//! and the local SQLite copy are interchangeable.

mod sqlite;
mod supabase;

pub use sqlite::{default_db_path, SqliteStore};
pub use supabase::SupabaseStore;

use crate::error::StoreError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Raw inventory row as stored by the dashboard
///
/// Every column is optional: rows inserted by hand against the database can be
/// missing anything, and the feed/verification code decides what to do with them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawInventoryRow")]
pub struct InventoryRow {
    /// Opaque identifier; numeric and text ids are both carried as text
    pub id: Option<String>,
    pub plant_name: Option<String>,
    pub scientific_name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub sku: Option<String>,
    pub item_type: Option<String>,
    /// Sale unit override ("kg", "seedlings", "pots", ...)
    pub unit: Option<String>,
    /// Honey age label, only meaningful for honey rows
    pub age: Option<String>,
    /// `None` when the column is null or not a number
    pub quantity: Option<f64>,
    /// `None` when the column is null or not a number
    pub price: Option<f64>,
    pub ready_for_sale: Option<bool>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    /// Non-null `quantity` value that is not a number, kept verbatim
    #[serde(skip)]
    pub quantity_unparsed: Option<String>,
    /// Non-null `price` value that is not a number, kept verbatim
    #[serde(skip)]
    pub price_unparsed: Option<String>,
}

impl InventoryRow {
    /// The `quantity` column holds something, numeric or not
    pub fn has_quantity(&self) -> bool {
        self.quantity.is_some() || self.quantity_unparsed.is_some()
    }

    /// The `price` column holds something, numeric or not
    pub fn has_price(&self) -> bool {
        self.price.is_some() || self.price_unparsed.is_some()
    }
}

/// Wire shape of a row; numeric columns are split into value and leftover text
#[derive(Deserialize)]
struct RawInventoryRow {
    #[serde(default, deserialize_with = "opaque_id")]
    id: Option<String>,
    #[serde(default)]
    plant_name: Option<String>,
    #[serde(default)]
    scientific_name: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    sku: Option<String>,
    #[serde(default)]
    item_type: Option<String>,
    #[serde(default)]
    unit: Option<String>,
    #[serde(default)]
    age: Option<String>,
    #[serde(default)]
    quantity: Option<Value>,
    #[serde(default)]
    price: Option<Value>,
    #[serde(default, deserialize_with = "lenient_flag")]
    ready_for_sale: Option<bool>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    updated_at: Option<String>,
}

impl From<RawInventoryRow> for InventoryRow {
    fn from(raw: RawInventoryRow) -> Self {
        let (quantity, quantity_unparsed) = split_number(raw.quantity);
        let (price, price_unparsed) = split_number(raw.price);
        Self {
            id: raw.id,
            plant_name: raw.plant_name,
            scientific_name: raw.scientific_name,
            category: raw.category,
            description: raw.description,
            image_url: raw.image_url,
            sku: raw.sku,
            item_type: raw.item_type,
            unit: raw.unit,
            age: raw.age,
            quantity,
            price,
            ready_for_sale: raw.ready_for_sale,
            created_at: raw.created_at,
            updated_at: raw.updated_at,
            quantity_unparsed,
            price_unparsed,
        }
    }
}

fn split_number(value: Option<Value>) -> (Option<f64>, Option<String>) {
    match value {
        None | Some(Value::Null) => (None, None),
        Some(Value::Number(n)) => (n.as_f64(), None),
        Some(Value::String(s)) => (None, Some(s)),
        Some(other) => (None, Some(other.to_string())),
    }
}

/// Read-only access to the inventory table
#[async_trait::async_trait]
pub trait InventoryStore: Send + Sync {
    /// Sale-ready plant and honey rows: `ready_for_sale = true` and
    /// (`item_type = 'Honey'` or `category = 'Organic Honey'` or `item_type IS NULL`)
    async fn list_feed_rows(&self) -> StoreResult<Vec<InventoryRow>>;

    /// Every row in the table
    async fn list_all_rows(&self) -> StoreResult<Vec<InventoryRow>>;

    /// Look up a single row by its id
    async fn find_by_id(&self, id: &str) -> StoreResult<Option<InventoryRow>>;
}

/// Accepts string or numeric ids, anything else reads as missing.
pub(crate) fn opaque_id<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Only JSON numbers count as numbers; strings, booleans and null read as `None`.
pub(crate) fn lenient_number<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_f64(),
        _ => None,
    })
}

fn lenient_flag<'de, D>(deserializer: D) -> std::result::Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Bool(b)) => Some(b),
        _ => None,
    })
}

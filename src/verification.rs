//! Dashboard-provenance verification
//!
//! Rows written through the management dashboard always carry complete
//! metadata. Anything else was inserted by hand against the database.

use crate::store::InventoryRow;
use serde::{Deserialize, Serialize};

/// Item types the dashboard can assign
pub const DASHBOARD_ITEM_TYPES: [&str; 3] = ["Plant", "Honey", "Consumable"];

/// Where a row came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    Dashboard,
    Manual,
}

/// Completeness checks the row failed, empty for dashboard rows
pub fn missing_fields(row: &InventoryRow) -> Vec<&'static str> {
    let filled = |value: &Option<String>| value.as_deref().is_some_and(|v| !v.is_empty());

    let mut missing = Vec::new();
    if !filled(&row.plant_name) {
        missing.push("plant_name");
    }
    if !filled(&row.category) {
        missing.push("category");
    }
    if !row.has_price() {
        missing.push("price");
    }
    if !row.has_quantity() {
        missing.push("quantity");
    }
    if row.created_at.is_none() {
        missing.push("created_at");
    }
    if row.updated_at.is_none() {
        missing.push("updated_at");
    }
    if !row
        .item_type
        .as_deref()
        .is_some_and(|t| DASHBOARD_ITEM_TYPES.contains(&t))
    {
        missing.push("item_type");
    }
    missing
}

pub fn classify(row: &InventoryRow) -> Provenance {
    provenance(&missing_fields(row))
}

fn provenance(missing: &[&str]) -> Provenance {
    if missing.is_empty() {
        Provenance::Dashboard
    } else {
        Provenance::Manual
    }
}

fn is_sellable(row: &InventoryRow) -> bool {
    row.ready_for_sale == Some(true) && row.quantity.is_some_and(|q| q > 0.0)
}

/// Counts reported by the verification endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationSummary {
    pub total_products: usize,
    pub dashboard_managed: usize,
    pub manually_created: usize,
    pub ready_for_sale_dashboard: usize,
    pub ready_for_sale_manual: usize,
}

/// One row in the verification listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductProvenance {
    pub id: Option<String>,
    pub name: Option<String>,
    pub category: Option<String>,
    pub quantity: Option<f64>,
    pub price: Option<f64>,
    pub created_at: Option<String>,
    pub source: Provenance,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_fields: Vec<String>,
}

/// Full verification result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub summary: VerificationSummary,
    pub dashboard_products: Vec<ProductProvenance>,
    pub manual_products: Vec<ProductProvenance>,
    pub message: String,
}

impl VerificationReport {
    /// Classify every row; each lands in exactly one list
    pub fn build(rows: &[InventoryRow]) -> Self {
        let mut summary = VerificationSummary {
            total_products: rows.len(),
            ..Default::default()
        };
        let mut dashboard_products = Vec::new();
        let mut manual_products = Vec::new();

        for row in rows {
            let missing = missing_fields(row);
            let source = provenance(&missing);
            let entry = ProductProvenance {
                id: row.id.clone(),
                name: row.plant_name.clone(),
                category: row.category.clone(),
                quantity: row.quantity,
                price: row.price,
                created_at: row.created_at.clone(),
                source,
                missing_fields: missing.into_iter().map(str::to_string).collect(),
            };

            match source {
                Provenance::Dashboard => {
                    summary.dashboard_managed += 1;
                    if is_sellable(row) {
                        summary.ready_for_sale_dashboard += 1;
                    }
                    dashboard_products.push(entry);
                }
                Provenance::Manual => {
                    summary.manually_created += 1;
                    if is_sellable(row) {
                        summary.ready_for_sale_manual += 1;
                    }
                    manual_products.push(entry);
                }
            }
        }

        let message = format!(
            "Found {} dashboard-managed and {} manually-created products ({} of {} dashboard products ready for sale)",
            summary.dashboard_managed,
            summary.manually_created,
            summary.ready_for_sale_dashboard,
            summary.dashboard_managed
        );

        Self {
            summary,
            dashboard_products,
            manual_products,
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dashboard_row(id: &str, item_type: &str) -> InventoryRow {
        InventoryRow {
            id: Some(id.to_string()),
            plant_name: Some("Grafted Mango".to_string()),
            category: Some("Fruit Trees".to_string()),
            item_type: Some(item_type.to_string()),
            quantity: Some(20.0),
            price: Some(400.0),
            ready_for_sale: Some(true),
            created_at: Some("2025-01-10T09:00:00Z".to_string()),
            updated_at: Some("2025-01-11T09:00:00Z".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn complete_rows_are_dashboard_managed() {
        for item_type in DASHBOARD_ITEM_TYPES {
            assert_eq!(classify(&dashboard_row("1", item_type)), Provenance::Dashboard);
        }
    }

    #[test]
    fn unknown_item_type_is_manual() {
        let row = dashboard_row("1", "Seed");
        assert_eq!(classify(&row), Provenance::Manual);
        assert_eq!(missing_fields(&row), vec!["item_type"]);
    }

    #[test]
    fn empty_name_counts_as_missing() {
        let mut row = dashboard_row("1", "Plant");
        row.plant_name = Some(String::new());
        row.updated_at = None;
        assert_eq!(missing_fields(&row), vec!["plant_name", "updated_at"]);
    }

    #[test]
    fn zero_price_and_quantity_are_present() {
        let mut row = dashboard_row("1", "Plant");
        row.price = Some(0.0);
        row.quantity = Some(0.0);
        assert_eq!(classify(&row), Provenance::Dashboard);
    }

    #[test]
    fn non_numeric_price_is_present() {
        let mut row = dashboard_row("1", "Plant");
        row.price = None;
        row.price_unparsed = Some("free".to_string());
        assert!(missing_fields(&row).is_empty());
        assert_eq!(classify(&row), Provenance::Dashboard);

        let report = VerificationReport::build(&[row]);
        assert_eq!(report.summary.dashboard_managed, 1);
        assert_eq!(report.dashboard_products[0].source, Provenance::Dashboard);
    }

    #[test]
    fn report_partitions_every_row() {
        let mut manual = dashboard_row("3", "Plant");
        manual.created_at = None;
        let mut sold_out = dashboard_row("2", "Honey");
        sold_out.quantity = Some(0.0);
        let mut manual_ready = InventoryRow {
            id: Some("4".to_string()),
            plant_name: Some("Moringa".to_string()),
            quantity: Some(3.0),
            ready_for_sale: Some(true),
            ..Default::default()
        };
        manual_ready.price = Some(50.0);

        let rows = vec![dashboard_row("1", "Plant"), sold_out, manual, manual_ready];
        let report = VerificationReport::build(&rows);

        assert_eq!(report.summary.total_products, 4);
        assert_eq!(
            report.dashboard_products.len() + report.manual_products.len(),
            report.summary.total_products
        );
        assert_eq!(report.summary.dashboard_managed, 2);
        assert_eq!(report.summary.manually_created, 2);
        assert_eq!(report.summary.ready_for_sale_dashboard, 1);
        assert_eq!(report.summary.ready_for_sale_manual, 2);
        assert_eq!(report.manual_products[0].missing_fields, vec!["created_at"]);
        assert!(report.dashboard_products[0].missing_fields.is_empty());
    }

    #[test]
    fn report_serializes_source_tag() {
        let report = VerificationReport::build(&[dashboard_row("1", "Plant")]);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["dashboard_products"][0]["source"], "dashboard");
        assert!(json["dashboard_products"][0].get("missing_fields").is_none());
    }
}

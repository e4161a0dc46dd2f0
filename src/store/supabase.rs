//! PostgREST client for the hosted inventory table
//!
//! Row filters are sent as PostgREST query parameters; nothing is written.

use super::{InventoryRow, InventoryStore, StoreResult};
use crate::error::StoreError;

/// PostgREST filter selecting plant and honey rows
const PLANT_OR_HONEY_FILTER: &str =
    "(item_type.eq.Honey,category.eq.\"Organic Honey\",item_type.is.null)";

/// Inventory store backed by the hosted database's REST interface
pub struct SupabaseStore {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    table: String,
}

impl SupabaseStore {
    pub fn new(base_url: &str, api_key: &str, table: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            table: table.to_string(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }

    /// `GET /rest/v1/{table}?select=*&...filters`
    async fn select(&self, filters: &[(&str, &str)]) -> StoreResult<Vec<InventoryRow>> {
        log::debug!("Querying {} with {} filter(s)", self.table, filters.len());

        let response = self
            .client
            .get(self.endpoint())
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Accept", "application/json")
            .query(&[("select", "*")])
            .query(filters)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StoreError::HttpStatus(response.status()));
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait::async_trait]
impl InventoryStore for SupabaseStore {
    async fn list_feed_rows(&self) -> StoreResult<Vec<InventoryRow>> {
        self.select(&[
            ("ready_for_sale", "eq.true"),
            ("or", PLANT_OR_HONEY_FILTER),
            ("order", "plant_name.asc"),
        ])
        .await
    }

    async fn list_all_rows(&self) -> StoreResult<Vec<InventoryRow>> {
        self.select(&[("order", "created_at.asc")]).await
    }

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<InventoryRow>> {
        let filter = format!("eq.{}", id);
        let mut rows = self.select(&[("id", filter.as_str()), ("limit", "1")]).await?;
        Ok(rows.pop())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn store_with_mock(mock_uri: &str) -> SupabaseStore {
        SupabaseStore::new(&format!("{}/", mock_uri), "anon-key", "inventory")
    }

    #[tokio::test]
    async fn list_feed_rows_sends_postgrest_filters() {
        let mock_server = MockServer::start().await;
        let store = store_with_mock(&mock_server.uri());

        Mock::given(method("GET"))
            .and(path("/rest/v1/inventory"))
            .and(query_param("select", "*"))
            .and(query_param("ready_for_sale", "eq.true"))
            .and(query_param("or", PLANT_OR_HONEY_FILTER))
            .and(header("apikey", "anon-key"))
            .and(header("Authorization", "Bearer anon-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                { "id": 1, "plant_name": "Olive", "quantity": 45, "price": 1200, "ready_for_sale": true },
                { "id": 2, "plant_name": "Forest Honey", "item_type": "Honey", "quantity": 5, "price": 800, "ready_for_sale": true }
            ])))
            .mount(&mock_server)
            .await;

        let rows = store.list_feed_rows().await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id.as_deref(), Some("1"));
        assert_eq!(rows[1].item_type.as_deref(), Some("Honey"));
    }

    #[tokio::test]
    async fn find_by_id_returns_none_for_empty_result() {
        let mock_server = MockServer::start().await;
        let store = store_with_mock(&mock_server.uri());

        Mock::given(method("GET"))
            .and(path("/rest/v1/inventory"))
            .and(query_param("id", "eq.77"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&mock_server)
            .await;

        assert!(store.find_by_id("77").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn find_by_id_returns_row() {
        let mock_server = MockServer::start().await;
        let store = store_with_mock(&mock_server.uri());

        Mock::given(method("GET"))
            .and(path("/rest/v1/inventory"))
            .and(query_param("id", "eq.abc-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                { "id": "abc-1", "plant_name": "Loquat", "quantity": 5, "price": 300 }
            ])))
            .mount(&mock_server)
            .await;

        let row = store.find_by_id("abc-1").await.unwrap().unwrap();
        assert_eq!(row.plant_name.as_deref(), Some("Loquat"));
        assert_eq!(row.quantity, Some(5.0));
    }

    #[tokio::test]
    async fn error_status_maps_to_http_status_error() {
        let mock_server = MockServer::start().await;
        let store = store_with_mock(&mock_server.uri());

        Mock::given(method("GET"))
            .and(path("/rest/v1/inventory"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&mock_server)
            .await;

        match store.list_all_rows().await {
            Err(StoreError::HttpStatus(status)) => assert_eq!(status.as_u16(), 401),
            other => panic!("expected HttpStatus error, got {:?}", other.map(|r| r.len())),
        }
    }

    #[tokio::test]
    async fn malformed_body_maps_to_parse_error() {
        let mock_server = MockServer::start().await;
        let store = store_with_mock(&mock_server.uri());

        Mock::given(method("GET"))
            .and(path("/rest/v1/inventory"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&mock_server)
            .await;

        assert!(matches!(
            store.list_all_rows().await,
            Err(StoreError::Parse(_))
        ));
    }
}

//! Nursery Feed - public product feed and storefront sync
//!
//! Serves sale-ready nursery inventory to the external shop website,
//! reports which inventory rows were created through the dashboard, and
//! checks stock for storefront checkouts.

pub mod catalog;
pub mod config;
pub mod cors;
pub mod error;
pub mod rate_limit;
pub mod stock_check;
pub mod store;
pub mod storefront;
pub mod verification;
pub mod web;

pub use catalog::{build_feed, AvailabilityStatus, ProductView};
pub use error::{ApiError, ConfigError, StoreError};
pub use rate_limit::RateLimiter;
pub use store::{InventoryRow, InventoryStore, SqliteStore, SupabaseStore};
pub use web::{create_router, AppState};

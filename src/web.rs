//! HTTP server for the storefront integration
//!
//! Routes:
//! - `GET  /api/products`          public product feed (rate limited)
//! - `GET  /api/products/verify`   provenance diagnostics
//! - `POST /api/update-inventory`  stock check (read-only, see [`crate::stock_check`])
//! - `GET  /health`
//!
//! `OPTIONS` on the API routes is answered by the family's CORS layer.

use axum::{
    extract::{rejection::JsonRejection, Request, State},
    http::Method,
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;

use crate::catalog::{build_feed, ProductView};
use crate::cors::{CorsPolicy, EndpointFamily};
use crate::error::ApiError;
use crate::rate_limit::{ClientKey, RateLimiter};
use crate::stock_check::{check_stock, StockCheckRequest, StockCheckResponse};
use crate::store::InventoryStore;
use crate::verification::{ProductProvenance, VerificationReport, VerificationSummary};

/// Shared application state, built once at start-up
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn InventoryStore>,
    pub limiter: Arc<RateLimiter>,
    pub cors: Arc<CorsPolicy>,
}

impl AppState {
    pub fn new(store: Arc<dyn InventoryStore>, limiter: RateLimiter, cors: CorsPolicy) -> Self {
        Self {
            store,
            limiter: Arc::new(limiter),
            cors: Arc::new(cors),
        }
    }
}

/// `GET /api/products` response
#[derive(Debug, Serialize, Deserialize)]
pub struct FeedResponse {
    pub success: bool,
    pub products: Vec<ProductView>,
    pub total_count: usize,
}

/// `GET /api/products/verify` response
#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub success: bool,
    pub summary: VerificationSummary,
    pub dashboard_products: Vec<ProductProvenance>,
    pub manual_products: Vec<ProductProvenance>,
    pub message: String,
}

#[derive(Serialize)]
struct HealthResponse {
    success: bool,
    status: &'static str,
}

/// GET /health
async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        success: true,
        status: "ok",
    })
}

/// GET /api/products
async fn products_handler(State(state): State<AppState>) -> Result<Json<FeedResponse>, ApiError> {
    let rows = state.store.list_feed_rows().await.map_err(|e| {
        log::error!("Failed to fetch products: {}", e);
        ApiError::upstream("Failed to fetch products")
    })?;

    let products = build_feed(&rows);
    log::debug!("Serving {} of {} feed rows", products.len(), rows.len());

    Ok(Json(FeedResponse {
        success: true,
        total_count: products.len(),
        products,
    }))
}

/// GET /api/products/verify
async fn verify_handler(State(state): State<AppState>) -> Result<Json<VerifyResponse>, ApiError> {
    let rows = state.store.list_all_rows().await.map_err(|e| {
        log::error!("Verification query failed: {}", e);
        ApiError::Upstream {
            message: "Failed to verify products",
            code: Some("DATABASE_ERROR"),
        }
    })?;

    let report = VerificationReport::build(&rows);
    Ok(Json(VerifyResponse {
        success: true,
        summary: report.summary,
        dashboard_products: report.dashboard_products,
        manual_products: report.manual_products,
        message: report.message,
    }))
}

/// POST /api/update-inventory
async fn update_inventory_handler(
    State(state): State<AppState>,
    body: Result<Json<StockCheckRequest>, JsonRejection>,
) -> Result<Json<StockCheckResponse>, ApiError> {
    let Json(request) = body.map_err(|rejection| {
        log::debug!("Rejected stock check body: {}", rejection);
        ApiError::Validation("Invalid request body".to_string())
    })?;

    check_stock(state.store.as_ref(), &request).await.map(Json)
}

/// Reject callers over their budget before the CORS layer runs
async fn rate_limit(
    State(state): State<AppState>,
    ClientKey(key): ClientKey,
    request: Request,
    next: Next,
) -> Response {
    if request.method() != Method::OPTIONS && !state.limiter.allow(&key) {
        log::warn!("Rate limit exceeded for {}", key);
        return ApiError::RateLimited.into_response();
    }
    next.run(request).await
}

/// Unexpected panics become the generic 500 body
fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    log::error!("Handler panicked: {}", detail);
    ApiError::Internal.into_response()
}

/// Build the web server router
pub fn create_router(state: AppState) -> Router {
    let cors = Arc::clone(&state.cors);

    let feed = Router::new()
        .route("/api/products", get(products_handler))
        .layer(cors.layer(EndpointFamily::Storefront))
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit));

    let verify = Router::new()
        .route("/api/products/verify", get(verify_handler))
        .layer(cors.layer(EndpointFamily::Storefront));

    let checkout = Router::new()
        .route("/api/update-inventory", post(update_inventory_handler))
        .layer(cors.layer(EndpointFamily::Checkout));

    Router::new()
        .route("/health", get(health_handler))
        .merge(feed)
        .merge(verify)
        .merge(checkout)
        .layer(CatchPanicLayer::custom(panic_response))
        .with_state(state)
}

/// Start the web server and run until `shutdown` resolves
///
/// Binds to 0.0.0.0 (all interfaces) so the service works behind a container
/// port mapping or the hosting platform's proxy.
pub async fn serve(
    state: AppState,
    port: u16,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let app = create_router(state);
    let addr = format!("0.0.0.0:{}", port);

    log::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await
}

#[cfg(test)]
#[path = "web_tests.rs"]
mod tests;

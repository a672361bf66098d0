//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Liveness check
//! GET  /health/ready                    - Readiness check (database ping)
//!
//! # Products
//! GET  /api/products                    - Product listing
//! GET  /api/products/{id}               - Product detail
//!
//! # Cart (requires auth)
//! GET    /api/cart                      - Current cart with priced lines
//! POST   /api/cart/items                - Add/merge a line
//! DELETE /api/cart/items/{product_id}   - Remove a line
//!
//! # Payments
//! POST /api/payment/payu/create         - Sign a new gateway transaction
//! POST /api/payment/payu/callback       - Gateway server-to-server callback
//! POST /api/payment/verify              - User-initiated fallback verification
//! ```

pub mod cart;
pub mod payment;
pub mod products;

use axum::{
    Json,
    Router,
    extract::State,
    http::StatusCode,
    routing::{delete, get, post},
};
use serde_json::json;

use crate::state::AppState;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/items", post(cart::add_item))
        .route("/items/{product_id}", delete(cart::remove_item))
}

/// Create the payment routes router.
pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/payu/create", post(payment::create))
        .route("/payu/callback", post(payment::callback))
        .route("/verify", post(payment::verify))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(health_ready))
        .nest("/api/products", product_routes())
        .nest("/api/cart", cart_routes())
        .nest("/api/payment", payment_routes())
}

/// Liveness check: the process is up.
async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Readiness check: the database answers.
async fn health_ready(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    match sqlx::query("SELECT 1").execute(state.pool()).await {
        Ok(_) => Ok(Json(json!({ "status": "ready" }))),
        Err(e) => {
            tracing::error!(error = %e, "readiness check failed");
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}

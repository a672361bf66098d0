//! Database operations for storefront `PostgreSQL`.
//!
//! # Database: `vastra`
//!
//! ## Tables
//!
//! - `users` - Buyer accounts (email unique)
//! - `addresses` - Shipping addresses (latest row per user wins)
//! - `products` - Catalog (mrp, discount, optional selling price)
//! - `carts` / `cart_items` - One cart per user, ordered line items
//! - `orders` / `order_items` - Persisted orders; `payu_txn_id` is UNIQUE
//!   and is the authoritative idempotence guard for callback retries
//! - `payment_intents` - txn id -> user binding written at initiation
//! - `sessions` - Tower-sessions storage
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via
//! `sqlx::migrate!` at startup.

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub mod addresses;
pub mod carts;
pub mod orders;
pub mod payment_intents;
pub mod products;
pub mod users;

pub use addresses::AddressRepository;
pub use carts::CartRepository;
pub use orders::OrderRepository;
pub use payment_intents::PaymentIntentRepository;
pub use products::ProductRepository;
pub use users::UserRepository;

/// Errors returned by repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Underlying database error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A uniqueness constraint was violated.
    ///
    /// For orders this is the "already processed" signal: a duplicate
    /// callback or a callback/fallback race lost to an earlier insert.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A stored value failed to parse back into its domain type.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

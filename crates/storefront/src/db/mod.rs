//! Database operations for storefront `PostgreSQL`.
//!
//! # Tables
//!
//! - `users` - Customer accounts (authentication lives elsewhere; the
//!   storefront only reads identity)
//! - `addresses` - Saved shipping addresses feeding the "profile" shipping
//!   option
//! - `tower_sessions.session` - Tower-sessions storage
//! - `categories` / `products` / `product_variations` - The catalog, loaded
//!   into memory by the catalog service
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p lumine-cli -- migrate
//! ```

pub mod products;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

/// Errors surfaced by the repository layer.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Query failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A row held data the domain types reject.
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

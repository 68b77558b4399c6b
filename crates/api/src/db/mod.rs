//! Database operations for the Meridian `PostgreSQL` database.
//!
//! ## Tables
//!
//! - `users` - Customer and admin accounts
//! - `auth_tokens` - Opaque bearer tokens (issued out-of-band)
//! - `products` - Catalog with inventory and optional special offers
//! - `cart_lines` - One user's persistent cart
//! - `purchases` - Immutable purchase records with address snapshots
//! - `addresses` - Saved user addresses
//! - `branches` - Pickup locations
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p meridian-cli -- migrate
//! ```
//!
//! All queries use the runtime `sqlx::query_as`/`sqlx::query` APIs with
//! explicit row structs, so the crate builds without a live database.

pub mod addresses;
pub mod branches;
pub mod carts;
pub mod products;
pub mod purchases;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use addresses::AddressRepository;
pub use branches::BranchRepository;
pub use carts::CartRepository;
pub use products::ProductRepository;
pub use purchases::PurchaseRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g. unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
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

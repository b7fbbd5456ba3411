//! Database operations for the storefront.
//!
//! # Tables read or written here
//!
//! - `products`, `categories`, `homepage_sections` - Catalog (read-only here)
//! - `customers` - Customer accounts with Argon2 password hashes
//! - `orders` - Draft and finalized orders, items snapshotted as JSONB
//! - `favorites` - Customer/product membership
//! - `tower_sessions.session` - Session storage (cart, current customer)
//!
//! # Migrations
//!
//! Migrations live in the workspace `migrations/` directory and run via:
//! ```bash
//! cargo run -p graphica-cli -- migrate
//! ```

pub mod catalog;
pub mod customers;
pub mod favorites;
pub mod orders;

use std::time::Duration;

use graphica_core::records::RecordError;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use catalog::{CategoryRepository, ProductRepository, SectionRepository};
pub use customers::CustomerRepository;
pub use favorites::FavoriteRepository;
pub use orders::{OrderRepository, OrderUpdateError};

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

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl From<RecordError> for RepositoryError {
    fn from(err: RecordError) -> Self {
        Self::DataCorruption(err.to_string())
    }
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

/// Convert decoded rows into domain values, failing on the first bad row.
pub(crate) fn convert_all<R, T>(rows: Vec<R>) -> Result<Vec<T>, RepositoryError>
where
    T: TryFrom<R, Error = RecordError>,
{
    rows.into_iter()
        .map(|row| T::try_from(row).map_err(RepositoryError::from))
        .collect()
}

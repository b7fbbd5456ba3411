//! Database operations for the back office.
//!
//! # Tables written here
//!
//! - `products` - Catalog products; `keywords` is re-derived on every write
//! - `categories` - Product categories (one nesting level)
//! - `homepage_sections` - Curated product rails; `position` is unique and
//!   checked at commit so a reorder can swap positions inside one transaction
//!
//! # Migrations
//!
//! Migrations live in the workspace `migrations/` directory and run via:
//! ```bash
//! cargo run -p graphica-cli -- migrate
//! ```

pub mod categories;
pub mod products;
pub mod sections;

use std::time::Duration;

use graphica_core::records::RecordError;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use categories::CategoryRepository;
pub use products::ProductRepository;
pub use sections::{SectionRepository, SectionUpdateError};

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

    /// Constraint violation (e.g., duplicate slug, category still in use).
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
        .max_connections(5)
        .min_connections(1)
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

/// Map unique and foreign-key violations to `Conflict`.
pub(crate) fn conflict_on_constraint(err: sqlx::Error, message: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err
        && (db_err.is_unique_violation() || db_err.is_foreign_key_violation())
    {
        return RepositoryError::Conflict(message.to_string());
    }
    RepositoryError::Database(err)
}

//! Database migration command.
//!
//! Migrations live in `migrations/` at the workspace root and are embedded
//! at compile time. Both binaries share the one schema.

use super::{CommandError, connect};

/// Apply every pending migration.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../../migrations").run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}

//! Bulk import from a CSV file on disk.

use std::path::Path;

use graphica_admin::services::ImportService;
use graphica_core::ImportReport;

use super::{CommandError, connect};

/// Import the file through the same service the admin API uses.
pub async fn run(path: &Path, dry_run: bool) -> Result<(), CommandError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| CommandError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let pool = connect().await?;
    let report = ImportService::new(&pool).run(bytes.as_slice(), dry_run).await?;
    print_report(&report, dry_run);
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_report(report: &ImportReport, dry_run: bool) {
    let verb = if dry_run { "would import" } else { "imported" };
    println!("{verb} {} product(s), skipped {}", report.succeeded, report.skipped);
    for rejected in &report.rejections {
        println!("  row {}: {}", rejected.row, rejected.reason);
    }
}

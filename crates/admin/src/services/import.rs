//! CSV bulk import.
//!
//! Rows are validated one by one; an invalid row is skipped with a reason
//! and never aborts the batch. The valid rows are then applied in a single
//! transaction, so readers see either none or all of them.

use std::collections::HashSet;
use std::io::Read;

use chrono::Utc;
use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use graphica_core::{CsvProductRecord, ImportReport, ProductId, ProductImport, RowRejection};

use crate::db::{CategoryRepository, RepositoryError, products};

/// Columns a file must declare in its header row.
const REQUIRED_COLUMNS: &[&str] = &["name", "basePrice", "categoryId"];

/// Failures that abort the whole import.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("unreadable CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("header row is missing required column {0}")]
    MissingColumn(&'static str),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for ImportError {
    fn from(err: sqlx::Error) -> Self {
        Self::Repository(err.into())
    }
}

/// Rows that passed validation, with their 1-based row numbers, plus the
/// report of those that did not.
#[derive(Debug, Default)]
pub struct ParsedImport {
    pub rows: Vec<(usize, ProductImport)>,
    pub report: ImportReport,
}

/// Parse and validate a CSV document against the set of known category
/// slugs.
///
/// # Errors
///
/// Returns `ImportError` if the header row is unreadable or lacks a required
/// column. Problems in individual rows are reported, not returned.
pub fn parse_csv<R: Read>(
    reader: R,
    known_categories: &HashSet<String>,
) -> Result<ParsedImport, ImportError> {
    let mut csv = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = csv.headers()?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == *column) {
            return Err(ImportError::MissingColumn(column));
        }
    }

    let mut parsed = ParsedImport::default();
    for (index, result) in csv.deserialize::<CsvProductRecord>().enumerate() {
        let row = index + 1;
        let outcome = result
            .map_err(|e| RowRejection::Malformed(e.to_string()))
            .and_then(ProductImport::try_from)
            .and_then(|import| {
                if known_categories.contains(import.category_id.as_str()) {
                    Ok(import)
                } else {
                    Err(RowRejection::UnknownCategory(import.category_id.to_string()))
                }
            });

        match outcome {
            Ok(import) => parsed.rows.push((row, import)),
            Err(reason) => {
                tracing::warn!(row, %reason, "Skipping import row");
                parsed.report.reject(row, reason);
            }
        }
    }
    Ok(parsed)
}

pub struct ImportService<'a> {
    pool: &'a PgPool,
}

impl<'a> ImportService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Import a CSV document. With `dry_run` the rows are validated and
    /// counted but nothing is written.
    ///
    /// Rows carrying an `id` that matches a stored product are merged into
    /// it: blank cells keep the stored values. Other rows create products.
    ///
    /// # Errors
    ///
    /// Returns `ImportError` if the file cannot be read or the batch cannot
    /// be committed; in the latter case nothing is written.
    #[instrument(skip(self, reader))]
    pub async fn run<R: Read>(&self, reader: R, dry_run: bool) -> Result<ImportReport, ImportError> {
        let known: HashSet<String> = CategoryRepository::new(self.pool)
            .ids()
            .await?
            .into_iter()
            .collect();
        let ParsedImport { rows, mut report } = parse_csv(reader, &known)?;

        if dry_run {
            report.succeeded = rows.len();
            tracing::info!(succeeded = report.succeeded, skipped = report.skipped, "Import dry run");
            return Ok(report);
        }

        let mut tx = self.pool.begin().await?;
        let now = Utc::now();
        for (row, import) in rows {
            let id = import.id.clone().unwrap_or_else(ProductId::generate);
            let product = match products::fetch(&mut tx, &id, true).await? {
                Some(mut existing) => {
                    import.merge_into(&mut existing);
                    existing
                }
                None => import.into_new_product(id, now),
            };
            products::upsert(&mut tx, &product).await?;
            tracing::debug!(row, product_id = %product.id, "Imported row");
            report.succeeded += 1;
        }
        tx.commit().await?;

        tracing::info!(succeeded = report.succeeded, skipped = report.skipped, "Import committed");
        Ok(report)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rust_decimal::dec;

    fn categories() -> HashSet<String> {
        ["cartoes", "flyers"].iter().map(ToString::to_string).collect()
    }

    #[test]
    fn valid_rows_pass_and_missing_price_is_skipped() {
        let csv = "\
name,basePrice,categoryId,formats,quantities
Cartão de Visita,100,cartoes,\"A4, A5\",\"1000, 2000\"
Flyer,50,flyers,,
Panfleto,80,flyers,A5,500
Adesivo,,flyers,,
";
        let parsed = parse_csv(csv.as_bytes(), &categories()).unwrap();

        assert_eq!(parsed.rows.len(), 3);
        assert_eq!(parsed.report.skipped, 1);
        assert_eq!(parsed.report.rejections[0].row, 4);
        assert_eq!(parsed.report.rejections[0].reason, "missing basePrice");

        let (row, first) = &parsed.rows[0];
        assert_eq!(*row, 1);
        assert_eq!(first.base_price, dec!(100));
        assert_eq!(first.quantities, Some(vec![1000, 2000]));
    }

    #[test]
    fn unknown_category_and_bad_quantity_are_skipped() {
        let csv = "\
id,name,basePrice,categoryId,quantities
p1,Banner,120,banners,
p2,Flyer,50,flyers,\"100, abc\"
p3,Flyer Premium,70,flyers,100
";
        let parsed = parse_csv(csv.as_bytes(), &categories()).unwrap();

        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rows[0].1.id, Some(ProductId::new("p3")));
        let reasons: Vec<&str> = parsed
            .report
            .rejections
            .iter()
            .map(|r| r.reason.as_str())
            .collect();
        assert_eq!(reasons, vec!["unknown category banners", "invalid quantity \"abc\""]);
    }

    #[test]
    fn header_must_declare_required_columns() {
        let csv = "name,categoryId\nFlyer,flyers\n";
        let err = parse_csv(csv.as_bytes(), &categories()).unwrap_err();
        assert!(matches!(err, ImportError::MissingColumn("basePrice")));
    }

    #[test]
    fn short_rows_are_rejected_not_fatal() {
        let csv = "name,basePrice,categoryId\nFlyer\nPanfleto,80,flyers\n";
        let parsed = parse_csv(csv.as_bytes(), &categories()).unwrap();
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.report.skipped, 1);
    }
}

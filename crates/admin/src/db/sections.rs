//! Homepage section composer storage.
//!
//! `position` carries a unique constraint that is deferred to commit, so a
//! reorder can write every new position inside one transaction without
//! tripping over the old values. Readers never see two sections sharing a
//! position.

use sqlx::PgPool;
use thiserror::Error;

use graphica_core::records::{SECTION_COLUMNS, SectionRecord};
use graphica_core::{HomepageSection, ProductId, ReorderError, SectionKey, plan_reorder};

use super::{RepositoryError, conflict_on_constraint, convert_all};

/// Why a section write was not applied.
#[derive(Debug, Error)]
pub enum SectionUpdateError {
    #[error("invalid order: {0}")]
    Reorder(#[from] ReorderError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for SectionUpdateError {
    fn from(err: sqlx::Error) -> Self {
        Self::Repository(err.into())
    }
}

pub struct SectionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SectionRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Every section, active or not, by position.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<HomepageSection>, RepositoryError> {
        let rows: Vec<SectionRecord> = sqlx::query_as(&format!(
            "SELECT {SECTION_COLUMNS} FROM homepage_sections ORDER BY position"
        ))
        .fetch_all(self.pool)
        .await?;
        convert_all(rows)
    }

    /// Append a section after the current last one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the key is taken or another
    /// section was appended concurrently.
    pub async fn create(
        &self,
        id: &SectionKey,
        title: &str,
        product_ids: &[ProductId],
        active: bool,
    ) -> Result<HomepageSection, RepositoryError> {
        let row: SectionRecord = sqlx::query_as(&format!(
            "INSERT INTO homepage_sections (id, title, position, active, product_ids)
             SELECT $1, $2, COALESCE(MAX(position) + 1, 0), $3, $4 FROM homepage_sections
             RETURNING {SECTION_COLUMNS}"
        ))
        .bind(id)
        .bind(title)
        .bind(active)
        .bind(product_ids)
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_on_constraint(e, "section already exists"))?;

        Ok(HomepageSection::try_from(row)?)
    }

    /// Replace the curated product list.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the section does not exist.
    pub async fn set_products(
        &self,
        id: &SectionKey,
        product_ids: &[ProductId],
    ) -> Result<HomepageSection, RepositoryError> {
        let row: Option<SectionRecord> = sqlx::query_as(&format!(
            "UPDATE homepage_sections SET product_ids = $2 WHERE id = $1 RETURNING {SECTION_COLUMNS}"
        ))
        .bind(id)
        .bind(product_ids)
        .fetch_optional(self.pool)
        .await?;

        Ok(HomepageSection::try_from(row.ok_or(RepositoryError::NotFound)?)?)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the section does not exist.
    pub async fn set_active(
        &self,
        id: &SectionKey,
        active: bool,
    ) -> Result<HomepageSection, RepositoryError> {
        let row: Option<SectionRecord> = sqlx::query_as(&format!(
            "UPDATE homepage_sections SET active = $2 WHERE id = $1 RETURNING {SECTION_COLUMNS}"
        ))
        .bind(id)
        .bind(active)
        .fetch_optional(self.pool)
        .await?;

        Ok(HomepageSection::try_from(row.ok_or(RepositoryError::NotFound)?)?)
    }

    /// Delete a section. Remaining positions keep their gaps; order is all
    /// that matters.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: &SectionKey) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM homepage_sections WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Apply a complete new ordering atomically.
    ///
    /// `requested` must name every existing section exactly once. The
    /// existing rows are locked, so a concurrent reorder or append waits.
    ///
    /// # Errors
    ///
    /// Returns `SectionUpdateError::Reorder` if `requested` is not a
    /// permutation of the stored sections.
    pub async fn reorder(
        &self,
        requested: &[SectionKey],
    ) -> Result<Vec<HomepageSection>, SectionUpdateError> {
        let mut tx = self.pool.begin().await?;

        let existing: Vec<String> =
            sqlx::query_scalar("SELECT id FROM homepage_sections ORDER BY position FOR UPDATE")
                .fetch_all(&mut *tx)
                .await?;
        let existing = existing
            .iter()
            .map(|key| SectionKey::parse(key))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| RepositoryError::DataCorruption(e.to_string()))?;

        let plan = plan_reorder(&existing, requested)?;
        for (key, position) in &plan {
            sqlx::query("UPDATE homepage_sections SET position = $2 WHERE id = $1")
                .bind(key)
                .bind(position)
                .execute(&mut *tx)
                .await?;
        }

        let rows: Vec<SectionRecord> = sqlx::query_as(&format!(
            "SELECT {SECTION_COLUMNS} FROM homepage_sections ORDER BY position"
        ))
        .fetch_all(&mut *tx)
        .await?;
        tx.commit().await?;

        tracing::info!(sections = plan.len(), "Homepage sections reordered");
        Ok(convert_all(rows)?)
    }
}

//! Customer favorites. Existence of a row is the whole record.

use sqlx::PgPool;

use graphica_core::records::{PRODUCT_COLUMNS, ProductRecord};
use graphica_core::{CustomerId, Product, ProductId};

use super::{RepositoryError, convert_all};

pub struct FavoriteRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> FavoriteRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Favorited products, most recently added first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, customer: &CustomerId) -> Result<Vec<Product>, RepositoryError> {
        let rows: Vec<ProductRecord> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products
             JOIN (SELECT product_id, created_at AS favorited_at
                   FROM favorites WHERE customer_id = $1) f ON f.product_id = products.id
             ORDER BY f.favorited_at DESC"
        ))
        .bind(customer)
        .fetch_all(self.pool)
        .await?;
        convert_all(rows)
    }

    /// Add a favorite. Adding twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn add(
        &self,
        customer: &CustomerId,
        product: &ProductId,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO favorites (customer_id, product_id) VALUES ($1, $2)
             ON CONFLICT (customer_id, product_id) DO NOTHING",
        )
        .bind(customer)
        .bind(product)
        .execute(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_foreign_key_violation()
            {
                return RepositoryError::NotFound;
            }
            RepositoryError::Database(e)
        })?;
        Ok(())
    }

    /// Remove a favorite. Returns whether one existed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn remove(
        &self,
        customer: &CustomerId,
        product: &ProductId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM favorites WHERE customer_id = $1 AND product_id = $2")
            .bind(customer)
            .bind(product)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

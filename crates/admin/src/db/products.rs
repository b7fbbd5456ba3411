//! Product writes and the transactional helpers used by bulk import.

use sqlx::types::Json;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};

use graphica_core::records::{PRODUCT_COLUMNS, ProductRecord};
use graphica_core::{Product, ProductFilter, ProductId};

use super::{RepositoryError, conflict_on_constraint, convert_all};

pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List products matching every predicate of `filter`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>, RepositoryError> {
        let mut query: QueryBuilder<'_, Postgres> =
            QueryBuilder::new(format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE TRUE"));

        if let Some(category) = &filter.category {
            query
                .push(" AND category_id = ")
                .push_bind(category.as_str().to_owned());
        }
        if let Some(term) = &filter.query {
            query
                .push(" AND ")
                .push_bind(term.clone())
                .push(" = ANY(keywords)");
        }
        if let Some(flag) = filter.flag {
            query.push(" AND ").push(flag.column());
        }
        query.push(" ORDER BY created_at DESC, id");

        let rows: Vec<ProductRecord> = query.build_query_as().fetch_all(self.pool).await?;
        convert_all(rows)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        fetch(&mut conn, id, false).await
    }

    /// Store a new product under its generated id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the category does not exist.
    pub async fn create(&self, product: &Product) -> Result<(), RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        upsert(&mut conn, product).await
    }

    /// Overwrite a stored product. Last write wins.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no product has this id.
    pub async fn update(&self, product: &Product) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE products SET name = $2, short_description = $3, description = $4,
                 image_urls = $5, image_hint = $6, base_price = $7, category_id = $8,
                 variations = $9, keywords = $10, show_on_home = $11, is_bestseller = $12,
                 is_new = $13
             WHERE id = $1",
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.short_description)
        .bind(&product.description)
        .bind(&product.image_urls)
        .bind(&product.image_hint)
        .bind(product.base_price)
        .bind(&product.category_id)
        .bind(Json(&product.variations))
        .bind(&product.keywords)
        .bind(product.show_on_home)
        .bind(product.is_bestseller)
        .bind(product.is_new)
        .execute(self.pool)
        .await
        .map_err(|e| conflict_on_constraint(e, "category does not exist"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Delete a product. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: &ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Read one product on `conn`, optionally locking the row until the
/// surrounding transaction ends.
pub(crate) async fn fetch(
    conn: &mut PgConnection,
    id: &ProductId,
    for_update: bool,
) -> Result<Option<Product>, RepositoryError> {
    let lock = if for_update { " FOR UPDATE" } else { "" };
    let row: Option<ProductRecord> = sqlx::query_as(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1{lock}"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    row.map(Product::try_from)
        .transpose()
        .map_err(RepositoryError::from)
}

/// Insert or fully overwrite `product` on `conn`.
pub(crate) async fn upsert(conn: &mut PgConnection, product: &Product) -> Result<(), RepositoryError> {
    sqlx::query(
        "INSERT INTO products (id, name, short_description, description, image_urls, image_hint,
             base_price, category_id, variations, keywords, show_on_home, is_bestseller, is_new,
             created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
         ON CONFLICT (id) DO UPDATE SET
             name = EXCLUDED.name,
             short_description = EXCLUDED.short_description,
             description = EXCLUDED.description,
             image_urls = EXCLUDED.image_urls,
             image_hint = EXCLUDED.image_hint,
             base_price = EXCLUDED.base_price,
             category_id = EXCLUDED.category_id,
             variations = EXCLUDED.variations,
             keywords = EXCLUDED.keywords,
             show_on_home = EXCLUDED.show_on_home,
             is_bestseller = EXCLUDED.is_bestseller,
             is_new = EXCLUDED.is_new",
    )
    .bind(&product.id)
    .bind(&product.name)
    .bind(&product.short_description)
    .bind(&product.description)
    .bind(&product.image_urls)
    .bind(&product.image_hint)
    .bind(product.base_price)
    .bind(&product.category_id)
    .bind(Json(&product.variations))
    .bind(&product.keywords)
    .bind(product.show_on_home)
    .bind(product.is_bestseller)
    .bind(product.is_new)
    .bind(product.created_at)
    .execute(&mut *conn)
    .await
    .map_err(|e| conflict_on_constraint(e, "category does not exist"))?;
    Ok(())
}

//! Catalog reads: products, categories and homepage sections.

use sqlx::{PgPool, Postgres, QueryBuilder};

use graphica_core::records::{
    CATEGORY_COLUMNS, CategoryRecord, PRODUCT_COLUMNS, ProductRecord, SECTION_COLUMNS,
    SectionRecord,
};
use graphica_core::{Category, HomepageSection, Product, ProductFilter, ProductId};

use super::{RepositoryError, convert_all};

/// Read access to products.
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
    /// The search term matches by membership in the materialized keyword set.
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
        let row: Option<ProductRecord> =
            sqlx::query_as(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"))
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

        row.map(Product::try_from)
            .transpose()
            .map_err(RepositoryError::from)
    }

    /// Fetch products by identifier-list membership. Result order is unspecified.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_many(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows: Vec<ProductRecord> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(self.pool)
        .await?;
        convert_all(rows)
    }
}

/// Read access to categories.
pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List categories, parents before children, optionally only menu entries.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, menu_only: bool) -> Result<Vec<Category>, RepositoryError> {
        let rows: Vec<CategoryRecord> = sqlx::query_as(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories
             WHERE ($1 = FALSE OR show_in_menu)
             ORDER BY parent_id NULLS FIRST, name"
        ))
        .bind(menu_only)
        .fetch_all(self.pool)
        .await?;
        convert_all(rows)
    }
}

/// Read access to homepage sections.
pub struct SectionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SectionRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Active sections ordered by position ascending.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_active(&self) -> Result<Vec<HomepageSection>, RepositoryError> {
        let rows: Vec<SectionRecord> = sqlx::query_as(&format!(
            "SELECT {SECTION_COLUMNS} FROM homepage_sections WHERE active ORDER BY position"
        ))
        .fetch_all(self.pool)
        .await?;
        convert_all(rows)
    }
}

//! Category CRUD.

use sqlx::PgPool;

use graphica_core::records::{CATEGORY_COLUMNS, CategoryRecord};
use graphica_core::{Category, CategorySlug};

use super::{RepositoryError, conflict_on_constraint, convert_all};

pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All categories, parents before children.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows: Vec<CategoryRecord> = sqlx::query_as(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY parent_id NULLS FIRST, name"
        ))
        .fetch_all(self.pool)
        .await?;
        convert_all(rows)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: &CategorySlug) -> Result<Option<Category>, RepositoryError> {
        let row: Option<CategoryRecord> = sqlx::query_as(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Category::try_from)
            .transpose()
            .map_err(RepositoryError::from)
    }

    /// Slugs of every stored category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn ids(&self) -> Result<Vec<String>, RepositoryError> {
        let ids = sqlx::query_scalar("SELECT id FROM categories")
            .fetch_all(self.pool)
            .await?;
        Ok(ids)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    pub async fn create(&self, category: &Category) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO categories (id, name, image_url, parent_id, show_on_home, show_in_menu)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(&category.id)
        .bind(&category.name)
        .bind(&category.image_url)
        .bind(&category.parent_id)
        .bind(category.show_on_home)
        .bind(category.show_in_menu)
        .execute(self.pool)
        .await
        .map_err(|e| conflict_on_constraint(e, "category already exists"))?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no category has this slug.
    pub async fn update(&self, category: &Category) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE categories SET name = $2, image_url = $3, parent_id = $4,
                 show_on_home = $5, show_in_menu = $6
             WHERE id = $1",
        )
        .bind(&category.id)
        .bind(&category.name)
        .bind(&category.image_url)
        .bind(&category.parent_id)
        .bind(category.show_on_home)
        .bind(category.show_in_menu)
        .execute(self.pool)
        .await
        .map_err(|e| conflict_on_constraint(e, "parent category does not exist"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Whether any category names `id` as its parent.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn has_children(&self, id: &CategorySlug) -> Result<bool, RepositoryError> {
        let exists = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM categories WHERE parent_id = $1)")
            .bind(id)
            .fetch_one(self.pool)
            .await?;
        Ok(exists)
    }

    /// Delete a category. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` while products or subcategories
    /// still reference it.
    pub async fn delete(&self, id: &CategorySlug) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| conflict_on_constraint(e, "category is still in use"))?;
        Ok(result.rows_affected() > 0)
    }
}

//! Category management handlers.
//!
//! Writes validate the parent reference: it must exist, must not be the
//! category itself, and must be top-level. A category with children cannot
//! become a child. Together these keep nesting to one level, so no cycle
//! can form.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use graphica_core::{Category, CategoryInput, CategorySlug};

use crate::db::CategoryRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// Create request: the slug plus the writable fields.
#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub id: String,
    #[serde(flatten)]
    pub input: CategoryInput,
}

async fn validate(
    repo: &CategoryRepository<'_>,
    id: &CategorySlug,
    input: &CategoryInput,
    has_children: bool,
) -> Result<()> {
    let parent = match &input.parent_id {
        Some(parent_id) if parent_id != id => repo.get(parent_id).await?,
        _ => None,
    };
    input.validate(id, parent.as_ref())?;
    input.check_children(id, has_children)?;
    Ok(())
}

/// List categories.
#[instrument(skip(state, _admin))]
pub async fn index(
    State(state): State<AppState>,
    _admin: RequireAdmin,
) -> Result<Json<Vec<Category>>> {
    Ok(Json(CategoryRepository::new(state.pool()).list().await?))
}

/// Category detail.
#[instrument(skip(state, _admin))]
pub async fn show(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(slug): Path<String>,
) -> Result<Json<Category>> {
    let id = CategorySlug::parse(&slug)?;
    let category = CategoryRepository::new(state.pool())
        .get(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("category {slug}")))?;
    Ok(Json(category))
}

/// Create a category.
#[instrument(skip(state, _admin, req))]
pub async fn create(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Json(req): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<Category>)> {
    let id = CategorySlug::parse(&req.id)?;
    let repo = CategoryRepository::new(state.pool());
    validate(&repo, &id, &req.input, false).await?;

    let category = req.input.into_category(id);
    repo.create(&category).await?;

    tracing::info!(category = %category.id, "Category created");
    Ok((StatusCode::CREATED, Json(category)))
}

/// Replace a category's writable fields.
#[instrument(skip(state, _admin, input))]
pub async fn update(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(slug): Path<String>,
    Json(input): Json<CategoryInput>,
) -> Result<Json<Category>> {
    let id = CategorySlug::parse(&slug)?;
    let repo = CategoryRepository::new(state.pool());
    let has_children = repo.has_children(&id).await?;
    validate(&repo, &id, &input, has_children).await?;

    let category = input.into_category(id);
    repo.update(&category).await?;

    tracing::info!(category = %category.id, "Category updated");
    Ok(Json(category))
}

/// Delete a category. Refused while products or subcategories use it.
#[instrument(skip(state, _admin))]
pub async fn delete(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(slug): Path<String>,
) -> Result<StatusCode> {
    let id = CategorySlug::parse(&slug)?;
    if !CategoryRepository::new(state.pool()).delete(&id).await? {
        return Err(AppError::NotFound(format!("category {slug}")));
    }
    tracing::info!(category = %id, "Category deleted");
    Ok(StatusCode::NO_CONTENT)
}

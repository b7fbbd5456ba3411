//! Product management handlers.

use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::instrument;

use graphica_core::{
    CatalogFlag, CategorySlug, ImportReport, Product, ProductFilter, ProductId, ProductInput,
    normalize_query,
};

use crate::db::{CategoryRepository, ProductRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::services::ImportService;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub category: Option<String>,
    pub q: Option<String>,
    pub flag: Option<CatalogFlag>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportQuery {
    #[serde(default)]
    pub dry_run: bool,
}

/// The category must exist before a product can reference it.
async fn ensure_category(state: &AppState, id: &CategorySlug) -> Result<()> {
    CategoryRepository::new(state.pool())
        .get(id)
        .await?
        .map(|_| ())
        .ok_or_else(|| AppError::BadRequest(format!("category {id} does not exist")))
}

/// List products.
#[instrument(skip(state, _admin))]
pub async fn index(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Query(query): Query<ProductQuery>,
) -> Result<Json<Vec<Product>>> {
    let filter = ProductFilter {
        category: query
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(CategorySlug::parse)
            .transpose()?,
        query: query.q.as_deref().and_then(normalize_query),
        flag: query.flag,
    };
    let products = ProductRepository::new(state.pool()).list(&filter).await?;
    Ok(Json(products))
}

/// Product detail.
#[instrument(skip(state, _admin))]
pub async fn show(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<String>,
) -> Result<Json<Product>> {
    let product = ProductRepository::new(state.pool())
        .get(&ProductId::new(id.clone()))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;
    Ok(Json(product))
}

/// Create a product. The keyword set is derived from the name.
#[instrument(skip(state, _admin, input))]
pub async fn create(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Json(input): Json<ProductInput>,
) -> Result<(StatusCode, Json<Product>)> {
    input.validate()?;
    ensure_category(&state, &input.category_id).await?;

    let product = input.into_product(ProductId::generate(), Utc::now())?;
    ProductRepository::new(state.pool()).create(&product).await?;

    tracing::info!(product_id = %product.id, "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

/// Replace a product's writable fields, keeping its id and creation time.
#[instrument(skip(state, _admin, input))]
pub async fn update(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<String>,
    Json(input): Json<ProductInput>,
) -> Result<Json<Product>> {
    input.validate()?;
    let products = ProductRepository::new(state.pool());
    let existing = products
        .get(&ProductId::new(id.clone()))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;
    ensure_category(&state, &input.category_id).await?;

    let product = input.into_product(existing.id, existing.created_at)?;
    products.update(&product).await?;

    tracing::info!(product_id = %product.id, "Product updated");
    Ok(Json(product))
}

/// Delete a product. Favorites referencing it go with it; homepage sections
/// drop it when rendered.
#[instrument(skip(state, _admin))]
pub async fn delete(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    if !ProductRepository::new(state.pool())
        .delete(&ProductId::new(id.clone()))
        .await?
    {
        return Err(AppError::NotFound(format!("product {id}")));
    }
    tracing::info!(product_id = %id, "Product deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Bulk import from a CSV body.
#[instrument(skip(state, _admin, body), fields(bytes = body.len()))]
pub async fn import(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Query(query): Query<ImportQuery>,
    body: Bytes,
) -> Result<Json<ImportReport>> {
    let report = ImportService::new(state.pool())
        .run(body.as_ref(), query.dry_run)
        .await?;
    Ok(Json(report))
}

//! Homepage section handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use graphica_core::{HomepageSection, ProductId, SectionKey};

use crate::db::SectionRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSectionRequest {
    pub id: SectionKey,
    pub title: String,
    #[serde(default)]
    pub product_ids: Vec<ProductId>,
    #[serde(default = "default_active")]
    pub active: bool,
}

const fn default_active() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetProductsRequest {
    pub product_ids: Vec<ProductId>,
}

#[derive(Debug, Deserialize)]
pub struct SetActiveRequest {
    pub active: bool,
}

/// The complete new ordering, first section first.
#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub order: Vec<SectionKey>,
}

fn parse_key(key: &str) -> Result<SectionKey> {
    Ok(SectionKey::parse(key)?)
}

/// All sections, inactive included, by position.
#[instrument(skip(state, _admin))]
pub async fn index(
    State(state): State<AppState>,
    _admin: RequireAdmin,
) -> Result<Json<Vec<HomepageSection>>> {
    Ok(Json(SectionRepository::new(state.pool()).list().await?))
}

/// Append a new section at the end.
#[instrument(skip(state, _admin, req), fields(section = %req.id))]
pub async fn create(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Json(req): Json<CreateSectionRequest>,
) -> Result<(StatusCode, Json<HomepageSection>)> {
    let title = req.title.trim();
    if title.is_empty() {
        return Err(AppError::BadRequest("section title cannot be empty".into()));
    }
    let section = SectionRepository::new(state.pool())
        .create(&req.id, title, &req.product_ids, req.active)
        .await?;

    tracing::info!(section = %section.id, position = section.position, "Section created");
    Ok((StatusCode::CREATED, Json(section)))
}

/// Replace the curated product list. Order is kept as given.
#[instrument(skip(state, _admin, req))]
pub async fn set_products(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(key): Path<String>,
    Json(req): Json<SetProductsRequest>,
) -> Result<Json<HomepageSection>> {
    let key = parse_key(&key)?;
    let section = SectionRepository::new(state.pool())
        .set_products(&key, &req.product_ids)
        .await?;
    Ok(Json(section))
}

#[instrument(skip(state, _admin))]
pub async fn set_active(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(key): Path<String>,
    Json(req): Json<SetActiveRequest>,
) -> Result<Json<HomepageSection>> {
    let key = parse_key(&key)?;
    let section = SectionRepository::new(state.pool())
        .set_active(&key, req.active)
        .await?;
    Ok(Json(section))
}

#[instrument(skip(state, _admin))]
pub async fn delete(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(key): Path<String>,
) -> Result<StatusCode> {
    let key = parse_key(&key)?;
    if !SectionRepository::new(state.pool()).delete(&key).await? {
        return Err(AppError::NotFound(format!("section {key}")));
    }
    tracing::info!(section = %key, "Section deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Apply a full reordering. Partial orderings are rejected.
#[instrument(skip(state, _admin, req), fields(sections = req.order.len()))]
pub async fn reorder(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Json(req): Json<ReorderRequest>,
) -> Result<Json<Vec<HomepageSection>>> {
    let sections = SectionRepository::new(state.pool())
        .reorder(&req.order)
        .await?;
    Ok(Json(sections))
}

//! Customer account route handlers: order history and favorites.
//!
//! Every handler requires a logged-in customer and only ever reads or writes
//! that customer's own records.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;

use graphica_core::{Order, OrderId, Product, ProductId};

use crate::db::{FavoriteRepository, OrderRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::state::AppState;

/// Finalized orders, newest first. Drafts are never listed.
#[instrument(skip_all)]
pub async fn orders(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
) -> Result<Json<Vec<Order>>> {
    let orders = OrderRepository::new(state.pool())
        .list_for_customer(&customer.id)
        .await?;
    Ok(Json(orders))
}

/// One of the customer's orders. Another customer's order is reported as
/// missing.
#[instrument(skip(state, customer))]
pub async fn order(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    Path(id): Path<String>,
) -> Result<Json<Order>> {
    let order = OrderRepository::new(state.pool())
        .get_for_customer(&customer.id, &OrderId::new(id.clone()))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {id}")))?;
    Ok(Json(order))
}

/// Favorite products, most recently added first.
#[instrument(skip_all)]
pub async fn favorites(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
) -> Result<Json<Vec<Product>>> {
    let products = FavoriteRepository::new(state.pool())
        .list(&customer.id)
        .await?;
    Ok(Json(products))
}

/// Add a favorite. Repeating the call is harmless.
#[instrument(skip(state, customer))]
pub async fn add_favorite(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    FavoriteRepository::new(state.pool())
        .add(&customer.id, &ProductId::new(id.clone()))
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound(format!("product {id}")),
            other => other.into(),
        })?;
    Ok(StatusCode::NO_CONTENT)
}

/// Remove a favorite.
#[instrument(skip(state, customer))]
pub async fn remove_favorite(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let removed = FavoriteRepository::new(state.pool())
        .remove(&customer.id, &ProductId::new(id.clone()))
        .await?;
    if !removed {
        return Err(AppError::NotFound(format!("favorite {id}")));
    }
    Ok(StatusCode::NO_CONTENT)
}

//! Checkout route handlers.

use axum::{Json, extract::State};
use serde::Serialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::payments::CheckoutSession;
use crate::routes::cart::{clear_cart, load_cart};
use crate::services::CheckoutService;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub cleared: bool,
}

/// Create a hosted payment session for the session cart.
///
/// The cart is kept until the customer returns from a successful payment.
#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    session: Session,
) -> Result<Json<CheckoutSession>> {
    let cart = load_cart(&session).await;
    let checkout = CheckoutService::new(state.pool(), state.stripe(), state.config())
        .create_session(&cart, &customer)
        .await?;
    Ok(Json(checkout))
}

/// Return target after a successful payment. Clears the cart; the order
/// itself is finalized by the webhook.
#[instrument(skip_all)]
pub async fn success(session: Session) -> Result<Json<SuccessResponse>> {
    clear_cart(&session).await?;
    Ok(Json(SuccessResponse { cleared: true }))
}

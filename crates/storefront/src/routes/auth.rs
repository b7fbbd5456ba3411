//! Authentication route handlers.
//!
//! Email and password accounts. A successful register or login stores the
//! customer in the session; the cart stays with the session across login.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{OptionalAuth, clear_current_customer, set_current_customer};
use crate::models::{CurrentCustomer, Customer};
use crate::services::AuthService;
use crate::state::AppState;

/// Login request body.
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Registration request body.
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub customer: Option<CurrentCustomer>,
}

async fn start_session(session: &Session, customer: &Customer) -> Result<()> {
    let current = CurrentCustomer::from(customer);
    set_current_customer(session, &current).await?;
    set_sentry_user(&current.id, Some(current.email.as_str()));
    Ok(())
}

/// Register a new customer and log them in.
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Customer>)> {
    let customer = AuthService::new(state.pool())
        .register(&req.email, &req.password, req.name.as_deref())
        .await?;
    start_session(&session, &customer).await?;

    tracing::info!(customer_id = %customer.id, "Customer registered");
    Ok((StatusCode::CREATED, Json(customer)))
}

/// Log in with email and password.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<LoginRequest>,
) -> Result<Json<Customer>> {
    let customer = AuthService::new(state.pool())
        .login(&req.email, &req.password)
        .await?;
    start_session(&session, &customer).await?;

    tracing::info!(customer_id = %customer.id, "Customer logged in");
    Ok(Json(customer))
}

/// Log out. The cart is kept.
#[instrument(skip_all)]
pub async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_customer(&session).await?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

/// The logged-in customer, or `null`.
pub async fn me(OptionalAuth(customer): OptionalAuth) -> Json<MeResponse> {
    Json(MeResponse { customer })
}

//! Homepage handler.

use axum::{Json, extract::State};
use serde::Serialize;
use tracing::instrument;

use crate::error::Result;
use crate::services::HomeSection;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HomeResponse {
    pub sections: Vec<HomeSection>,
}

/// Active homepage sections, in position order, each with its products in
/// curated order.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>) -> Result<Json<HomeResponse>> {
    let page = state.home().get_or_compose(state.pool()).await?;
    Ok(Json(HomeResponse {
        sections: page.as_ref().clone(),
    }))
}

//! Cart route handlers.
//!
//! The cart lives in the session and is never persisted outside it until
//! checkout. Every mutating handler returns the updated cart.

use axum::{Json, extract::State};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use graphica_core::{Cart, CartError, CartItem, ProductId};

use crate::db::ProductRepository;
use crate::error::{AppError, Result};
use crate::models::session_keys;
use crate::state::AppState;

// =============================================================================
// Views
// =============================================================================

/// Cart line as shown to the customer.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineView {
    #[serde(flatten)]
    pub item: CartItem,
    pub line_total: Decimal,
}

/// Cart as shown to the customer.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub total: Decimal,
    pub count: usize,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            lines: cart
                .lines()
                .iter()
                .map(|item| CartLineView {
                    line_total: item.line_total(),
                    item: item.clone(),
                })
                .collect(),
            total: cart.total(),
            count: cart.count(),
        }
    }
}

// =============================================================================
// Session Helpers
// =============================================================================

/// Load the session cart, treating an unreadable entry as empty.
pub(crate) async fn load_cart(session: &Session) -> Cart {
    match session.get::<Cart>(session_keys::CART).await {
        Ok(cart) => cart.unwrap_or_default(),
        Err(e) => {
            tracing::warn!("Failed to read session cart: {e}");
            Cart::new()
        }
    }
}

async fn store_cart(session: &Session, cart: &Cart) -> Result<()> {
    session.insert(session_keys::CART, cart).await?;
    Ok(())
}

/// Empty the session cart.
pub(crate) async fn clear_cart(session: &Session) -> Result<()> {
    session.remove::<Cart>(session_keys::CART).await?;
    Ok(())
}

// =============================================================================
// Request Types
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub product_id: String,
    pub format: Option<String>,
    pub finishing: Option<String>,
    pub quantity: u32,
    #[serde(default)]
    pub artwork_service: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCartRequest {
    pub line_id: String,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveFromCartRequest {
    pub line_id: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// Current cart.
#[instrument(skip(session))]
pub async fn show(session: Session) -> Json<CartView> {
    let cart = load_cart(&session).await;
    Json(CartView::from(&cart))
}

/// Add a product selection, merging with an existing line of the same
/// product, format and finishing.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<AddToCartRequest>,
) -> Result<Json<CartView>> {
    let product = ProductRepository::new(state.pool())
        .get(&ProductId::new(req.product_id.clone()))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {}", req.product_id)))?;

    let artwork_fee = req
        .artwork_service
        .then_some(state.config().artwork_service_fee);
    let item = CartItem::for_product(
        &product,
        non_blank(req.format),
        non_blank(req.finishing),
        req.quantity,
        artwork_fee,
    )?;

    let mut cart = load_cart(&session).await;
    cart.add(item);
    store_cart(&session, &cart).await?;

    tracing::debug!(product_id = %product.id, lines = cart.count(), "Added to cart");
    Ok(Json(CartView::from(&cart)))
}

/// Set the quantity of a line. Zero or below removes it.
#[instrument(skip(session))]
pub async fn update(
    session: Session,
    Json(req): Json<UpdateCartRequest>,
) -> Result<Json<CartView>> {
    let mut cart = load_cart(&session).await;
    cart.update_quantity(&req.line_id, req.quantity)?;
    store_cart(&session, &cart).await?;
    Ok(Json(CartView::from(&cart)))
}

/// Remove a line.
#[instrument(skip(session))]
pub async fn remove(
    session: Session,
    Json(req): Json<RemoveFromCartRequest>,
) -> Result<Json<CartView>> {
    let mut cart = load_cart(&session).await;
    if !cart.remove(&req.line_id) {
        return Err(CartError::LineNotFound(req.line_id).into());
    }
    store_cart(&session, &cart).await?;
    Ok(Json(CartView::from(&cart)))
}

/// Empty the cart.
#[instrument(skip(session))]
pub async fn clear(session: Session) -> Result<Json<CartView>> {
    clear_cart(&session).await?;
    Ok(Json(CartView::from(&Cart::new())))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use graphica_core::{CategorySlug, Product, Variations};
    use rust_decimal::dec;

    fn flyer() -> Product {
        Product {
            id: ProductId::new("flyer"),
            name: "Flyer".to_string(),
            short_description: String::new(),
            description: String::new(),
            image_urls: vec![],
            image_hint: None,
            base_price: dec!(50),
            category_id: CategorySlug::parse("flyers").unwrap(),
            variations: Variations {
                quantities: Some(vec![100, 250]),
                ..Variations::default()
            },
            keywords: vec![],
            show_on_home: false,
            is_bestseller: false,
            is_new: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn view_carries_line_totals_and_count() {
        let mut cart = Cart::new();
        cart.add(CartItem::for_product(&flyer(), None, None, 200, Some(dec!(35))).unwrap());

        let view = CartView::from(&cart);
        assert_eq!(view.lines.len(), 1);
        assert_eq!(view.lines[0].line_total, dec!(135));
        assert_eq!(view.total, dec!(135));
        assert_eq!(view.count, 1);

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["lines"][0]["lineId"], "flyer::");
        assert!(json["lines"][0].get("lineTotal").is_some());
    }

    #[test]
    fn blank_selections_are_none() {
        assert_eq!(non_blank(Some("  ".to_string())), None);
        assert_eq!(non_blank(Some(" A4 ".to_string())), Some("A4".to_string()));
        assert_eq!(non_blank(None), None);
    }
}

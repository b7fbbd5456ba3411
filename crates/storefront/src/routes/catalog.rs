//! Catalog read handlers: product listing, product detail, categories.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use graphica_core::{
    CatalogFlag, Category, CategorySlug, Product, ProductFilter, ProductId, TierPrice,
    normalize_query, round_for_display,
};

use crate::db::{CategoryRepository, ProductRepository};
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Catalog query parameters. Every predicate is optional.
#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub category: Option<String>,
    pub q: Option<String>,
    pub flag: Option<CatalogFlag>,
}

impl ProductQuery {
    fn into_filter(self) -> Result<ProductFilter> {
        let category = self
            .category
            .filter(|c| !c.trim().is_empty())
            .map(|c| CategorySlug::parse(c.trim()))
            .transpose()
            .map_err(|e| AppError::BadRequest(format!("invalid category: {e}")))?;
        Ok(ProductFilter {
            category,
            query: self.q.as_deref().and_then(normalize_query),
            flag: self.flag,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct CategoryQuery {
    #[serde(default)]
    pub menu: bool,
}

/// Product with the prices a product page shows.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub unit_price: Decimal,
    pub tier_prices: Vec<TierPrice>,
}

impl From<Product> for ProductDetail {
    fn from(product: Product) -> Self {
        Self {
            unit_price: round_for_display(product.unit_price()),
            tier_prices: product.tier_prices(),
            product,
        }
    }
}

/// List products, newest first.
#[instrument(skip(state))]
pub async fn products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<Vec<Product>>> {
    let filter = query.into_filter()?;
    let products = ProductRepository::new(state.pool()).list(&filter).await?;
    Ok(Json(products))
}

/// Product detail.
#[instrument(skip(state))]
pub async fn product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProductDetail>> {
    let product = ProductRepository::new(state.pool())
        .get(&ProductId::new(id.clone()))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;
    Ok(Json(product.into()))
}

/// List categories, optionally only those shown in the menu.
#[instrument(skip(state))]
pub async fn categories(
    State(state): State<AppState>,
    Query(query): Query<CategoryQuery>,
) -> Result<Json<Vec<Category>>> {
    let categories = CategoryRepository::new(state.pool()).list(query.menu).await?;
    Ok(Json(categories))
}

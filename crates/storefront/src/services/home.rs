//! Homepage composition.
//!
//! Active sections in position order, each with its products re-sorted into
//! the section's curated order. The composed page is cached for a minute.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde::Serialize;
use sqlx::PgPool;

use graphica_core::{HomepageSection, Product, ProductId, SectionKey, order_by_ids};

use crate::db::{ProductRepository, RepositoryError, SectionRepository};

/// How long a composed homepage is served from memory.
const HOME_TTL: Duration = Duration::from_secs(60);

/// A rendered section.
#[derive(Debug, Clone, Serialize)]
pub struct HomeSection {
    pub id: SectionKey,
    pub title: String,
    pub products: Vec<Product>,
}

/// Cache for the composed homepage (single entry).
#[derive(Clone)]
pub struct HomeCache {
    cache: Cache<(), Arc<Vec<HomeSection>>>,
}

impl HomeCache {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(1)
                .time_to_live(HOME_TTL)
                .build(),
        }
    }

    /// The homepage, composed on a miss.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if composing fails; failures are not cached.
    pub async fn get_or_compose(
        &self,
        pool: &PgPool,
    ) -> Result<Arc<Vec<HomeSection>>, RepositoryError> {
        if let Some(page) = self.cache.get(&()).await {
            return Ok(page);
        }
        let page = Arc::new(compose(pool).await?);
        self.cache.insert((), Arc::clone(&page)).await;
        Ok(page)
    }
}

impl Default for HomeCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Read active sections and their products.
///
/// All referenced products are fetched in one identifier-list query.
///
/// # Errors
///
/// Returns `RepositoryError` if a query fails.
pub async fn compose(pool: &PgPool) -> Result<Vec<HomeSection>, RepositoryError> {
    let sections = SectionRepository::new(pool).list_active().await?;

    let mut wanted: Vec<ProductId> = sections
        .iter()
        .flat_map(|s| s.product_ids.iter().cloned())
        .collect();
    wanted.sort();
    wanted.dedup();
    let products = ProductRepository::new(pool).get_many(&wanted).await?;

    Ok(sections
        .into_iter()
        .map(|section| render_section(section, &products))
        .collect())
}

fn render_section(section: HomepageSection, products: &[Product]) -> HomeSection {
    let candidates: Vec<Product> = products
        .iter()
        .filter(|p| section.product_ids.contains(&p.id))
        .cloned()
        .collect();
    let ordered = order_by_ids(candidates, &section.product_ids);

    if ordered.len() < section.product_ids.len() {
        tracing::debug!(
            section = %section.id,
            missing = section.product_ids.len() - ordered.len(),
            "Dropping deleted products from homepage section"
        );
    }

    HomeSection {
        id: section.id,
        title: section.title,
        products: ordered,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use graphica_core::{CategorySlug, Variations};
    use rust_decimal::dec;

    fn product(id: &str) -> Product {
        Product {
            id: ProductId::new(id),
            name: id.to_uppercase(),
            short_description: String::new(),
            description: String::new(),
            image_urls: vec![],
            image_hint: None,
            base_price: dec!(10),
            category_id: CategorySlug::parse("cards").unwrap(),
            variations: Variations::default(),
            keywords: vec![],
            show_on_home: true,
            is_bestseller: false,
            is_new: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn section_products_follow_curated_order_and_skip_deleted() {
        let section = HomepageSection {
            id: SectionKey::parse("featured").unwrap(),
            title: "Featured".to_string(),
            position: 0,
            active: true,
            product_ids: vec![
                ProductId::new("c"),
                ProductId::new("gone"),
                ProductId::new("a"),
            ],
        };
        let fetched = vec![product("a"), product("b"), product("c")];

        let rendered = render_section(section, &fetched);
        let ids: Vec<&str> = rendered.products.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a"]);
        assert_eq!(rendered.title, "Featured");
    }
}

//! Homepage section ordering.

use std::collections::{HashMap, HashSet};

use crate::catalog::Product;
use crate::types::{ProductId, SectionKey};

/// Reasons a requested section ordering cannot be applied.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ReorderError {
    #[error("section {0} appears more than once")]
    Duplicate(SectionKey),
    #[error("section {0} does not exist")]
    Unknown(SectionKey),
    #[error("section {0} is missing from the new order")]
    Missing(SectionKey),
}

/// Turn a full new ordering into `(section, position)` writes.
///
/// `requested` must be a permutation of `existing`: every section exactly
/// once. Positions are 0-based.
///
/// # Errors
///
/// Returns a [`ReorderError`] for duplicated, unknown or omitted sections.
pub fn plan_reorder(
    existing: &[SectionKey],
    requested: &[SectionKey],
) -> Result<Vec<(SectionKey, i32)>, ReorderError> {
    let known: HashSet<&SectionKey> = existing.iter().collect();
    let mut seen = HashSet::with_capacity(requested.len());

    for key in requested {
        if !known.contains(key) {
            return Err(ReorderError::Unknown(key.clone()));
        }
        if !seen.insert(key) {
            return Err(ReorderError::Duplicate(key.clone()));
        }
    }
    if let Some(missing) = existing.iter().find(|key| !seen.contains(key)) {
        return Err(ReorderError::Missing(missing.clone()));
    }

    Ok(requested
        .iter()
        .cloned()
        .zip(0..)
        .collect())
}

/// Re-sort fetched products into the order of `ids`.
///
/// Identifier-list fetches do not preserve input order. Ids with no matching
/// product (deleted since the section was composed) are dropped.
#[must_use]
pub fn order_by_ids(products: Vec<Product>, ids: &[ProductId]) -> Vec<Product> {
    let mut by_id: HashMap<ProductId, Product> = products
        .into_iter()
        .map(|product| (product.id.clone(), product))
        .collect();

    ids.iter().filter_map(|id| by_id.remove(id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Variations;
    use crate::types::CategorySlug;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn keys(names: &[&str]) -> Vec<SectionKey> {
        names.iter().map(|n| SectionKey::parse(n).unwrap()).collect()
    }

    fn product(id: &str) -> Product {
        Product {
            id: ProductId::new(id),
            name: id.to_string(),
            short_description: String::new(),
            description: String::new(),
            image_urls: vec![],
            image_hint: None,
            base_price: Decimal::ONE,
            category_id: CategorySlug::parse("misc").unwrap(),
            variations: Variations::default(),
            keywords: vec![],
            show_on_home: true,
            is_bestseller: false,
            is_new: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn reorder_assigns_zero_based_positions() {
        let existing = keys(&["a", "b", "c"]);
        let plan = plan_reorder(&existing, &keys(&["c", "a", "b"])).unwrap();
        assert_eq!(
            plan,
            vec![
                (SectionKey::parse("c").unwrap(), 0),
                (SectionKey::parse("a").unwrap(), 1),
                (SectionKey::parse("b").unwrap(), 2),
            ]
        );
    }

    #[test]
    fn reorder_requires_a_permutation() {
        let existing = keys(&["a", "b", "c"]);
        assert!(matches!(
            plan_reorder(&existing, &keys(&["a", "b"])),
            Err(ReorderError::Missing(_))
        ));
        assert!(matches!(
            plan_reorder(&existing, &keys(&["a", "a", "b", "c"])),
            Err(ReorderError::Duplicate(_))
        ));
        assert!(matches!(
            plan_reorder(&existing, &keys(&["a", "b", "c", "d"])),
            Err(ReorderError::Unknown(_))
        ));
    }

    #[test]
    fn products_follow_section_order() {
        let fetched = vec![product("p1"), product("p2"), product("p3")];
        let ids = vec![ProductId::new("p3"), ProductId::new("p1"), ProductId::new("p2")];
        let ordered: Vec<String> = order_by_ids(fetched, &ids)
            .into_iter()
            .map(|p| p.id.to_string())
            .collect();
        assert_eq!(ordered, vec!["p3", "p1", "p2"]);
    }

    #[test]
    fn deleted_products_are_dropped() {
        let fetched = vec![product("p1")];
        let ids = vec![ProductId::new("gone"), ProductId::new("p1")];
        let ordered = order_by_ids(fetched, &ids);
        assert_eq!(ordered.len(), 1);
        assert_eq!(ordered[0].id.as_str(), "p1");
    }
}

//! Catalog records: products, categories and homepage sections.

pub mod keywords;
pub mod sections;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{CategorySlug, ProductId, SectionKey};

pub use keywords::{generate_keywords, normalize_query};
pub use sections::{ReorderError, order_by_ids, plan_reorder};

/// Validation failures for product writes.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ProductValidationError {
    #[error("product name cannot be empty")]
    EmptyName,
    #[error("base price cannot be negative")]
    NegativePrice,
    #[error("base price cannot have more than 2 decimal places")]
    PriceTooPrecise,
    #[error("base price is too large")]
    PriceOutOfRange,
    #[error("quantity tiers cannot be empty")]
    EmptyQuantities,
    #[error("quantity tiers must be positive")]
    NonPositiveQuantity,
    #[error("quantity tiers must be strictly ascending")]
    UnorderedQuantities,
}

/// Decimal places a stored price keeps (`NUMERIC(12, 2)`).
const MAX_PRICE_SCALE: u32 = 2;

/// Exclusive upper bound of a stored price: ten integer digits.
const PRICE_LIMIT: Decimal = Decimal::from_parts(1_410_065_408, 2, 0, false, 0);

/// Check that a base price fits the stored column without rounding.
/// Trailing zeros do not count as precision.
///
/// # Errors
///
/// Returns [`ProductValidationError::NegativePrice`],
/// [`ProductValidationError::PriceTooPrecise`] or
/// [`ProductValidationError::PriceOutOfRange`].
pub fn validate_base_price(price: Decimal) -> Result<(), ProductValidationError> {
    if price.is_sign_negative() {
        return Err(ProductValidationError::NegativePrice);
    }
    if price.normalize().scale() > MAX_PRICE_SCALE {
        return Err(ProductValidationError::PriceTooPrecise);
    }
    if price >= PRICE_LIMIT {
        return Err(ProductValidationError::PriceOutOfRange);
    }
    Ok(())
}

/// Variation axes a customer chooses from. Every axis is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variations {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formats: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finishings: Option<Vec<String>>,
    /// Ascending quantity tiers; the first entry is the base quantity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantities: Option<Vec<u32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub materials: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colors: Option<Vec<String>>,
}

impl Variations {
    /// Check the quantity-tier invariant: when present, a non-empty, strictly
    /// ascending sequence of positive integers.
    ///
    /// # Errors
    ///
    /// Returns the first [`ProductValidationError`] found.
    pub fn validate(&self) -> Result<(), ProductValidationError> {
        let Some(quantities) = &self.quantities else {
            return Ok(());
        };
        if quantities.is_empty() {
            return Err(ProductValidationError::EmptyQuantities);
        }
        if quantities.contains(&0) {
            return Err(ProductValidationError::NonPositiveQuantity);
        }
        if quantities.windows(2).any(|w| matches!(w, [a, b] if a >= b)) {
            return Err(ProductValidationError::UnorderedQuantities);
        }
        Ok(())
    }

    /// The base quantity tier used as the unit-price denominator.
    #[must_use]
    pub fn base_quantity(&self) -> Option<u32> {
        self.quantities.as_ref()?.first().copied()
    }
}

/// Price of a single unit: `base_price / base quantity tier`.
///
/// Falls back to the raw base price when there is no usable tier.
#[must_use]
pub fn unit_price(base_price: Decimal, variations: &Variations) -> Decimal {
    match variations.base_quantity() {
        Some(tier) if tier > 0 => base_price / Decimal::from(tier),
        _ => base_price,
    }
}

/// Quick filters exposed on the catalog read path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogFlag {
    Home,
    Bestseller,
    New,
}

impl CatalogFlag {
    /// Storage column backing the flag.
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::Home => "show_on_home",
            Self::Bestseller => "is_bestseller",
            Self::New => "is_new",
        }
    }
}

/// Catalog query. All predicates are optional and conjunctive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub category: Option<CategorySlug>,
    /// Normalized search term, matched against the keyword set.
    pub query: Option<String>,
    pub flag: Option<CatalogFlag>,
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub short_description: String,
    pub description: String,
    /// Ordered image URLs; the first is the primary image.
    pub image_urls: Vec<String>,
    pub image_hint: Option<String>,
    pub base_price: Decimal,
    pub category_id: CategorySlug,
    pub variations: Variations,
    pub keywords: Vec<String>,
    pub show_on_home: bool,
    pub is_bestseller: bool,
    pub is_new: bool,
    pub created_at: DateTime<Utc>,
}

/// Price of one quantity tier, for display on the product page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TierPrice {
    pub quantity: u32,
    pub price: Decimal,
}

impl Product {
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.image_urls.first().map(String::as_str)
    }

    #[must_use]
    pub fn unit_price(&self) -> Decimal {
        unit_price(self.base_price, &self.variations)
    }

    /// Linear price for each quantity tier. Display only; the cart prices
    /// lines with [`unit_price`] and never re-derives tiers.
    #[must_use]
    pub fn tier_prices(&self) -> Vec<TierPrice> {
        let unit = self.unit_price();
        self.variations
            .quantities
            .iter()
            .flatten()
            .map(|&quantity| TierPrice {
                quantity,
                price: crate::types::round_for_display(unit * Decimal::from(quantity)),
            })
            .collect()
    }
}

/// Writable product fields (admin create/update).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub name: String,
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_urls: Vec<String>,
    #[serde(default)]
    pub image_hint: Option<String>,
    pub base_price: Decimal,
    pub category_id: CategorySlug,
    #[serde(default)]
    pub variations: Variations,
    #[serde(default)]
    pub show_on_home: bool,
    #[serde(default)]
    pub is_bestseller: bool,
    #[serde(default)]
    pub is_new: bool,
}

impl ProductInput {
    /// # Errors
    ///
    /// Returns a [`ProductValidationError`] for an empty name, a price the
    /// store cannot hold exactly, or malformed quantity tiers.
    pub fn validate(&self) -> Result<(), ProductValidationError> {
        if self.name.trim().is_empty() {
            return Err(ProductValidationError::EmptyName);
        }
        validate_base_price(self.base_price)?;
        self.variations.validate()
    }

    /// Build the stored record, deriving the keyword set from the name.
    ///
    /// # Errors
    ///
    /// Returns a [`ProductValidationError`] if the input is invalid.
    pub fn into_product(
        self,
        id: ProductId,
        created_at: DateTime<Utc>,
    ) -> Result<Product, ProductValidationError> {
        self.validate()?;
        let name = self.name.trim().to_owned();
        Ok(Product {
            id,
            keywords: generate_keywords(&name),
            name,
            short_description: self.short_description,
            description: self.description,
            image_urls: self.image_urls,
            image_hint: self.image_hint,
            base_price: self.base_price,
            category_id: self.category_id,
            variations: self.variations,
            show_on_home: self.show_on_home,
            is_bestseller: self.is_bestseller,
            is_new: self.is_new,
            created_at,
        })
    }
}

/// Category write failures.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CategoryError {
    #[error("category name cannot be empty")]
    EmptyName,
    #[error("parent category {0} does not exist")]
    ParentNotFound(CategorySlug),
    #[error("a category cannot be its own parent")]
    SelfParent,
    #[error("parent category {0} is itself a subcategory")]
    NestedTooDeep(CategorySlug),
    #[error("category {0} has subcategories and cannot be nested")]
    HasSubcategories(CategorySlug),
}

/// A product category. The slug is both identifier and URL segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategorySlug,
    pub name: String,
    pub image_url: Option<String>,
    pub parent_id: Option<CategorySlug>,
    pub show_on_home: bool,
    pub show_in_menu: bool,
}

/// Writable category fields.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryInput {
    pub name: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub parent_id: Option<CategorySlug>,
    #[serde(default)]
    pub show_on_home: bool,
    #[serde(default = "default_true")]
    pub show_in_menu: bool,
}

const fn default_true() -> bool {
    true
}

impl CategoryInput {
    /// Validate the input for the category `id`, given the looked-up parent.
    ///
    /// Nesting is limited to one level, which rules out cycles.
    ///
    /// # Errors
    ///
    /// Returns a [`CategoryError`] for an empty name or an unusable parent.
    pub fn validate(
        &self,
        id: &CategorySlug,
        parent: Option<&Category>,
    ) -> Result<(), CategoryError> {
        if self.name.trim().is_empty() {
            return Err(CategoryError::EmptyName);
        }
        let Some(parent_id) = &self.parent_id else {
            return Ok(());
        };
        if parent_id == id {
            return Err(CategoryError::SelfParent);
        }
        let parent = parent.ok_or_else(|| CategoryError::ParentNotFound(parent_id.clone()))?;
        if parent.parent_id.is_some() {
            return Err(CategoryError::NestedTooDeep(parent.id.clone()));
        }
        Ok(())
    }

    /// A category that already has subcategories must stay top-level.
    ///
    /// # Errors
    ///
    /// Returns [`CategoryError::HasSubcategories`] when a parent is requested
    /// for a category with children.
    pub fn check_children(&self, id: &CategorySlug, has_children: bool) -> Result<(), CategoryError> {
        if has_children && self.parent_id.is_some() {
            return Err(CategoryError::HasSubcategories(id.clone()));
        }
        Ok(())
    }

    #[must_use]
    pub fn into_category(self, id: CategorySlug) -> Category {
        Category {
            id,
            name: self.name.trim().to_owned(),
            image_url: self.image_url,
            parent_id: self.parent_id,
            show_on_home: self.show_on_home,
            show_in_menu: self.show_in_menu,
        }
    }
}

/// A curated product rail on the landing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomepageSection {
    pub id: SectionKey,
    pub title: String,
    /// Display position, ascending; unique across sections.
    pub position: i32,
    pub active: bool,
    /// Products in display order.
    pub product_ids: Vec<ProductId>,
}

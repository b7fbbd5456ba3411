//! Database row shapes shared by the storefront and admin repositories.
//!
//! Rows decode with `sqlx::FromRow` and convert into domain types through
//! `TryFrom`, which re-validates keys, slugs and emails so a bad row surfaces
//! as data corruption instead of leaking into responses.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;

use crate::catalog::{Category, HomepageSection, Product, Variations};
use crate::order::{Order, OrderItem};
use crate::types::{CategorySlug, CustomerId, Email, OrderId, OrderStatus, ProductId, SectionKey};

/// A stored value failed domain validation.
#[derive(thiserror::Error, Debug)]
#[error("invalid {field} in database: {message}")]
pub struct RecordError {
    pub field: &'static str,
    pub message: String,
}

impl RecordError {
    fn new(field: &'static str, message: impl std::fmt::Display) -> Self {
        Self {
            field,
            message: message.to_string(),
        }
    }
}

/// Column list matching [`ProductRecord`].
pub const PRODUCT_COLUMNS: &str = "id, name, short_description, description, image_urls, \
     image_hint, base_price, category_id, variations, keywords, show_on_home, is_bestseller, \
     is_new, created_at";

#[derive(Debug, sqlx::FromRow)]
pub struct ProductRecord {
    pub id: String,
    pub name: String,
    pub short_description: String,
    pub description: String,
    pub image_urls: Vec<String>,
    pub image_hint: Option<String>,
    pub base_price: Decimal,
    pub category_id: String,
    pub variations: Json<Variations>,
    pub keywords: Vec<String>,
    pub show_on_home: bool,
    pub is_bestseller: bool,
    pub is_new: bool,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<ProductRecord> for Product {
    type Error = RecordError;

    fn try_from(row: ProductRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ProductId::new(row.id),
            name: row.name,
            short_description: row.short_description,
            description: row.description,
            image_urls: row.image_urls,
            image_hint: row.image_hint,
            base_price: row.base_price,
            category_id: CategorySlug::parse(&row.category_id)
                .map_err(|e| RecordError::new("category_id", e))?,
            variations: row.variations.0,
            keywords: row.keywords,
            show_on_home: row.show_on_home,
            is_bestseller: row.is_bestseller,
            is_new: row.is_new,
            created_at: row.created_at,
        })
    }
}

pub const CATEGORY_COLUMNS: &str = "id, name, image_url, parent_id, show_on_home, show_in_menu";

#[derive(Debug, sqlx::FromRow)]
pub struct CategoryRecord {
    pub id: String,
    pub name: String,
    pub image_url: Option<String>,
    pub parent_id: Option<String>,
    pub show_on_home: bool,
    pub show_in_menu: bool,
}

impl TryFrom<CategoryRecord> for Category {
    type Error = RecordError;

    fn try_from(row: CategoryRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: CategorySlug::parse(&row.id).map_err(|e| RecordError::new("id", e))?,
            name: row.name,
            image_url: row.image_url,
            parent_id: row
                .parent_id
                .as_deref()
                .map(CategorySlug::parse)
                .transpose()
                .map_err(|e| RecordError::new("parent_id", e))?,
            show_on_home: row.show_on_home,
            show_in_menu: row.show_in_menu,
        })
    }
}

pub const SECTION_COLUMNS: &str = "id, title, position, active, product_ids";

#[derive(Debug, sqlx::FromRow)]
pub struct SectionRecord {
    pub id: String,
    pub title: String,
    pub position: i32,
    pub active: bool,
    pub product_ids: Vec<String>,
}

impl TryFrom<SectionRecord> for HomepageSection {
    type Error = RecordError;

    fn try_from(row: SectionRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: SectionKey::parse(&row.id).map_err(|e| RecordError::new("id", e))?,
            title: row.title,
            position: row.position,
            active: row.active,
            product_ids: row.product_ids.into_iter().map(ProductId::new).collect(),
        })
    }
}

pub const ORDER_COLUMNS: &str = "id, customer_id, items, total_amount, status, ordered_at, \
     created_at, payment_session_id, payment_status, customer_name, customer_email";

#[derive(Debug, sqlx::FromRow)]
pub struct OrderRecord {
    pub id: String,
    pub customer_id: String,
    pub items: Json<Vec<OrderItem>>,
    pub total_amount: Option<Decimal>,
    pub status: Option<String>,
    pub ordered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub payment_session_id: Option<String>,
    pub payment_status: Option<String>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
}

impl TryFrom<OrderRecord> for Order {
    type Error = RecordError;

    fn try_from(row: OrderRecord) -> Result<Self, Self::Error> {
        let status = row
            .status
            .as_deref()
            .map(str::parse::<OrderStatus>)
            .transpose()
            .map_err(|e| RecordError::new("status", e))?;
        let customer_email = row
            .customer_email
            .as_deref()
            .map(Email::parse)
            .transpose()
            .map_err(|e| RecordError::new("customer_email", e))?;

        Ok(Self {
            id: OrderId::new(row.id),
            customer_id: CustomerId::new(row.customer_id),
            items: row.items.0,
            total_amount: row.total_amount,
            status,
            ordered_at: row.ordered_at,
            created_at: row.created_at,
            payment_session_id: row.payment_session_id,
            payment_status: row.payment_status,
            customer_name: row.customer_name,
            customer_email,
        })
    }
}

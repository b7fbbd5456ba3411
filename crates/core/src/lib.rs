//! Graphica Core - Domain types and rules for the print-shop storefront.
//!
//! This crate is shared by every Graphica component:
//! - `storefront` - Public catalog, cart, checkout and customer account API
//! - `admin` - Back-office catalog, homepage and import API
//! - `cli` - Migrations and bulk import from disk
//!
//! # Architecture
//!
//! The core crate contains types and pure logic only - no I/O, no HTTP
//! clients. Database row mappings live behind the `postgres` feature.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, slugs, emails, money and statuses
//! - [`catalog`] - Products, categories, keyword derivation, homepage sections
//! - [`cart`] - Session cart aggregation
//! - [`checkout`] - Payment line quoting
//! - [`order`] - Orders and their lifecycle transitions
//! - [`import`] - CSV row schema for bulk import

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod import;
pub mod order;
#[cfg(feature = "postgres")]
pub mod records;
pub mod types;

pub use cart::{Cart, CartError, CartItem};
pub use catalog::{
    CatalogFlag, Category, CategoryError, CategoryInput, HomepageSection, Product,
    ProductFilter, ProductInput, ProductValidationError, ReorderError, TierPrice, Variations,
    generate_keywords, normalize_query, order_by_ids, plan_reorder, unit_price,
};
pub use checkout::{LineQuote, QuoteError, SessionSummary, quote_line, quote_lines};
pub use import::{CsvProductRecord, ImportReport, ProductImport, RejectedRow, RowRejection};
pub use order::{
    Finalization, Order, OrderItem, OrderLifecycle, OrderTransitionError, Transition,
};
pub use types::*;

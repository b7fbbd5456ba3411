//! Business logic services for storefront.
//!
//! # Services
//!
//! - `auth` - Customer registration and password login
//! - `checkout` - Payment session creation and draft orders
//! - `home` - Homepage composition and caching
//! - `reconcile` - Payment webhook reconciliation into orders

pub mod auth;
pub mod checkout;
pub mod home;
pub mod reconcile;

pub use auth::{AuthError, AuthService};
pub use checkout::{CheckoutError, CheckoutService};
pub use home::{HomeCache, HomeSection};
pub use reconcile::{WebhookError, WebhookOutcome, WebhookService};

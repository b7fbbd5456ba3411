//! Core value types.
//!
//! Type-safe wrappers for identifiers, keys, emails, money and statuses.

pub mod email;
pub mod id;
pub mod price;
pub mod slug;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use price::{from_minor_units, round_for_display, to_minor_units};
pub use slug::{CategorySlug, SectionKey, SlugError};
pub use status::OrderStatus;

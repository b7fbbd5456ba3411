//! Stripe payment processor integration.
//!
//! - [`StripeClient`] creates hosted checkout sessions over the REST API
//! - [`verify_signature`] authenticates webhook deliveries
//! - [`events`] holds the webhook payload shapes we read

pub mod events;
mod signature;
mod stripe;

pub use events::{CheckoutSessionObject, CustomerDetails, Event};
pub use signature::{SIGNATURE_TOLERANCE_SECS, SignatureError, verify_signature};
#[cfg(test)]
pub(crate) use signature::tests::sign;
pub use stripe::{CheckoutSession, CheckoutSessionRequest, StripeClient};

use thiserror::Error;

/// Errors that can occur when calling the Stripe API.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl PaymentError {
    /// A message safe to show the customer.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Api { message, .. } => format!("Payment provider error: {message}"),
            Self::Http(_) => "Payment provider unreachable, please try again".to_string(),
            Self::Parse(_) => "Unexpected response from payment provider".to_string(),
        }
    }
}

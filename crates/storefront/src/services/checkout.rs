//! Checkout: cart snapshot → payment session + draft order.
//!
//! The order id is chosen before the session is created so it can travel in
//! the session metadata; the draft is written once the processor has
//! returned a session id. The webhook later finalizes that same draft.

use chrono::Utc;
use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use graphica_core::{Cart, Order, OrderId, OrderItem, QuoteError, SessionSummary, quote_lines};

use crate::config::StorefrontConfig;
use crate::db::{OrderRepository, RepositoryError};
use crate::models::CurrentCustomer;
use crate::payments::{CheckoutSession, CheckoutSessionRequest, PaymentError, StripeClient};

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("cart cannot be checked out: {0}")]
    Quote(#[from] QuoteError),
    #[error(transparent)]
    Payment(#[from] PaymentError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

pub struct CheckoutService<'a> {
    orders: OrderRepository<'a>,
    stripe: &'a StripeClient,
    config: &'a StorefrontConfig,
}

impl<'a> CheckoutService<'a> {
    #[must_use]
    pub const fn new(
        pool: &'a PgPool,
        stripe: &'a StripeClient,
        config: &'a StorefrontConfig,
    ) -> Self {
        Self {
            orders: OrderRepository::new(pool),
            stripe,
            config,
        }
    }

    /// Create a payment session for `cart` and store the draft order.
    ///
    /// The cart itself is left untouched so a failed attempt can be retried.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Quote` for an empty or unpriceable cart,
    /// `CheckoutError::Payment` when the processor refuses the session, and
    /// `CheckoutError::Repository` if the draft cannot be stored.
    #[instrument(skip(self, cart), fields(customer_id = %customer.id, lines = cart.count()))]
    pub async fn create_session(
        &self,
        cart: &Cart,
        customer: &CurrentCustomer,
    ) -> Result<CheckoutSession, CheckoutError> {
        let quotes = quote_lines(cart.lines())?;
        // Items are stored at their quoted amounts so the draft sums to the charge.
        let items = cart
            .lines()
            .iter()
            .zip(&quotes)
            .map(|(line, quote)| {
                OrderItem::quoted(line, quote)
                    .ok_or_else(|| QuoteError::AmountOutOfRange(line.line_id.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let order_id = OrderId::generate();
        let summary = SessionSummary::from_lines(cart.lines());
        let success_url = self.config.checkout_success_url();
        let cancel_url = self.config.checkout_cancel_url();

        let session = self
            .stripe
            .create_checkout_session(&CheckoutSessionRequest {
                lines: &quotes,
                customer_id: customer.id.as_str(),
                customer_email: customer.email.as_str(),
                order_id: order_id.as_str(),
                items_summary: summary.as_str(),
                success_url: &success_url,
                cancel_url: &cancel_url,
            })
            .await?;

        let draft = Order::draft(
            order_id,
            customer.id.clone(),
            items,
            Some(session.session_id.clone()),
            Utc::now(),
        );
        if let Err(err) = self.orders.insert(&draft).await {
            tracing::error!(
                order_id = %draft.id,
                session_id = %session.session_id,
                error = %err,
                "Payment session created but draft order could not be stored"
            );
            return Err(err.into());
        }

        tracing::info!(order_id = %draft.id, session_id = %session.session_id, "Draft order created");
        Ok(session)
    }
}

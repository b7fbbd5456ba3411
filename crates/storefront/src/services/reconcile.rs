//! Payment webhook reconciliation.
//!
//! Turns a verified `checkout.session.completed` delivery into a finalized
//! order. Delivery is at-least-once and unordered, so every step is safe to
//! repeat: finalization overwrites the same fields with the same values.

use chrono::{DateTime, TimeZone, Utc};
use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use graphica_core::{
    CustomerId, Email, Finalization, OrderId, OrderLifecycle, OrderTransitionError, Transition,
};

use crate::db::{CustomerRepository, OrderRepository, OrderUpdateError, RepositoryError};
use crate::payments::events::{CHECKOUT_SESSION_COMPLETED, METADATA_ORDER_ID, METADATA_USER_ID};
use crate::payments::{CheckoutSessionObject, Event, SignatureError, verify_signature};

/// Reasons a delivery is not applied.
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("invalid signature: {0}")]
    Signature(#[from] SignatureError),
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
    #[error("missing {0} metadata")]
    MissingMetadata(&'static str),
    #[error("customer {0} not found")]
    CustomerNotFound(CustomerId),
    #[error("order {0} not found")]
    OrderNotFound(OrderId),
    #[error("order {order} does not belong to customer {customer}")]
    OwnerMismatch { order: OrderId, customer: CustomerId },
    #[error("order {0} rejected finalization: {1}")]
    Rejected(OrderId, OrderTransitionError),
    #[error("reconciliation failed: {0}")]
    Internal(#[from] RepositoryError),
}

impl WebhookError {
    /// Integrity failures are the sender's problem and must not be retried
    /// as if they were transient.
    #[must_use]
    pub const fn is_integrity(&self) -> bool {
        !matches!(self, Self::Internal(_))
    }

    /// A verified payment that could not be applied: the customer was
    /// charged but the order stays a draft until someone intervenes.
    #[must_use]
    pub const fn needs_attention(&self) -> bool {
        matches!(
            self,
            Self::OwnerMismatch { .. }
                | Self::Rejected(
                    _,
                    OrderTransitionError::AmountMismatch { .. }
                        | OrderTransitionError::AmountOutOfRange
                )
        )
    }
}

/// What a delivery did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    Finalized(OrderId),
    /// The order was canceled before payment confirmation arrived.
    AlreadyCanceled(OrderId),
    /// Event types other than session completion are acknowledged and dropped.
    Ignored(String),
}

pub struct WebhookService<'a> {
    customers: CustomerRepository<'a>,
    orders: OrderRepository<'a>,
    webhook_secret: &'a str,
}

impl<'a> WebhookService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, webhook_secret: &'a str) -> Self {
        Self {
            customers: CustomerRepository::new(pool),
            orders: OrderRepository::new(pool),
            webhook_secret,
        }
    }

    /// Verify and reconcile one delivery.
    ///
    /// # Errors
    ///
    /// Returns a [`WebhookError`]; see [`WebhookError::is_integrity`].
    #[instrument(skip_all, fields(event_id = tracing::field::Empty))]
    pub async fn handle(
        &self,
        payload: &[u8],
        signature: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<WebhookOutcome, WebhookError> {
        let signature = signature.ok_or(SignatureError::MalformedHeader)?;
        verify_signature(self.webhook_secret, payload, signature, now.timestamp())?;

        let event: Event = serde_json::from_slice(payload)
            .map_err(|e| WebhookError::MalformedPayload(e.to_string()))?;
        tracing::Span::current().record("event_id", event.id.as_str());

        if event.event_type != CHECKOUT_SESSION_COMPLETED {
            tracing::debug!(event_id = %event.id, event_type = %event.event_type, "Ignoring event");
            return Ok(WebhookOutcome::Ignored(event.event_type));
        }

        let confirmed_at = Utc
            .timestamp_opt(event.created, 0)
            .single()
            .ok_or_else(|| WebhookError::MalformedPayload("invalid created timestamp".into()))?;
        let session: CheckoutSessionObject = serde_json::from_value(event.data.object)
            .map_err(|e| WebhookError::MalformedPayload(e.to_string()))?;

        self.finalize(&event.id, session, confirmed_at).await
    }

    async fn finalize(
        &self,
        event_id: &str,
        session: CheckoutSessionObject,
        confirmed_at: DateTime<Utc>,
    ) -> Result<WebhookOutcome, WebhookError> {
        let customer_id = CustomerId::new(
            session
                .metadata_value(METADATA_USER_ID)
                .ok_or(WebhookError::MissingMetadata(METADATA_USER_ID))?,
        );
        let order_id = OrderId::new(
            session
                .metadata_value(METADATA_ORDER_ID)
                .ok_or(WebhookError::MissingMetadata(METADATA_ORDER_ID))?,
        );
        let charged_minor = session
            .amount_total
            .ok_or_else(|| WebhookError::MalformedPayload("missing amount_total".into()))?;

        let customer = self
            .customers
            .get_by_id(&customer_id)
            .await?
            .ok_or_else(|| WebhookError::CustomerNotFound(customer_id.clone()))?;

        let draft = self
            .orders
            .get(&order_id)
            .await?
            .ok_or_else(|| WebhookError::OrderNotFound(order_id.clone()))?;
        if draft.customer_id != customer.id {
            return Err(WebhookError::OwnerMismatch {
                order: order_id,
                customer: customer.id,
            });
        }
        if draft.lifecycle() == OrderLifecycle::Canceled {
            tracing::warn!(%event_id, %order_id, "Payment confirmed for a canceled order");
            return Ok(WebhookOutcome::AlreadyCanceled(order_id));
        }

        let (email, name) = session
            .customer_details
            .map_or((None, None), |details| (details.email, details.name));
        let customer_email = email
            .as_deref()
            .and_then(|e| Email::parse(e).ok())
            .unwrap_or_else(|| customer.email.clone());
        let finalization = Finalization {
            charged_minor,
            customer_name: name.or_else(|| customer.name.clone()),
            customer_email,
            payment_session_id: session.id,
            payment_status: session.payment_status,
            confirmed_at,
        };

        match self
            .orders
            .apply(&order_id, Transition::Finalize(finalization))
            .await
        {
            Ok(order) => {
                tracing::info!(
                    %event_id,
                    order_id = %order.id,
                    total = ?order.total_amount,
                    "Order finalized"
                );
                Ok(WebhookOutcome::Finalized(order.id))
            }
            Err(OrderUpdateError::NotFound) => Err(WebhookError::OrderNotFound(order_id)),
            Err(OrderUpdateError::Rejected(OrderTransitionError::Canceled)) => {
                tracing::warn!(%event_id, %order_id, "Payment confirmed for a canceled order");
                Ok(WebhookOutcome::AlreadyCanceled(order_id))
            }
            Err(OrderUpdateError::Rejected(err)) => Err(WebhookError::Rejected(order_id, err)),
            Err(OrderUpdateError::Repository(err)) => Err(WebhookError::Internal(err)),
        }
    }
}

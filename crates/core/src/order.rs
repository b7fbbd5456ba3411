//! Orders and their lifecycle.
//!
//! An order is written as a draft when the checkout session is created and
//! finalized by the payment webhook. Both writers go through
//! [`Order::apply`], so the shape of a finalized order is decided in one
//! place.
//!
//! ```text
//! Draft ──Finalize──▶ Finalized(under_review) ──Advance──▶ … ──▶ delivered
//!   │                     │
//!   └──────Cancel─────────┴──────────────▶ Canceled
//! ```

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::CartItem;
use crate::checkout::{LineQuote, unit_amount_minor};
use crate::types::{CustomerId, Email, OrderId, OrderStatus, ProductId, from_minor_units};

/// Snapshot of a purchased line. Never re-joined against live product data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_finishing: Option<String>,
    pub line_total: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artwork_fee: Option<Decimal>,
}

impl OrderItem {
    /// Snapshot a cart line at the amount it was quoted to the processor.
    ///
    /// The stored line total is `unit_amount × quantity` in major units, so
    /// the items always sum to what the processor charges. Returns `None`
    /// when that amount does not fit in `i64` minor units.
    #[must_use]
    pub fn quoted(item: &CartItem, quote: &LineQuote) -> Option<Self> {
        Some(Self {
            product_id: item.product_id.clone(),
            name: item.name.clone(),
            quantity: quote.quantity,
            selected_format: item.selected_format.clone(),
            selected_finishing: item.selected_finishing.clone(),
            line_total: from_minor_units(quote.amount_minor()?),
            artwork_fee: item.artwork_fee,
        })
    }
}

/// Coarse lifecycle state, derived from the stored status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderLifecycle {
    Draft,
    Finalized,
    Canceled,
}

/// Data confirmed by the payment processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finalization {
    /// Amount actually charged, in minor units.
    pub charged_minor: i64,
    pub customer_name: Option<String>,
    pub customer_email: Email,
    pub payment_session_id: String,
    pub payment_status: String,
    /// Taken from the event, not the wall clock, so redelivery is stable.
    pub confirmed_at: DateTime<Utc>,
}

/// An order state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Finalize(Finalization),
    Advance,
    Cancel,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderTransitionError {
    #[error("order is canceled")]
    Canceled,
    #[error("order has not been paid yet")]
    NotFinalized,
    #[error("order status {0} is terminal")]
    Terminal(OrderStatus),
    #[error("charged amount {charged} does not match expected {expected}")]
    AmountMismatch { expected: i64, charged: i64 },
    #[error("order total is out of range")]
    AmountOutOfRange,
}

/// A customer order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub customer_id: CustomerId,
    pub items: Vec<OrderItem>,
    /// Confirmed by the processor; `None` while a draft.
    pub total_amount: Option<Decimal>,
    /// `None` while a draft.
    pub status: Option<OrderStatus>,
    pub ordered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub payment_session_id: Option<String>,
    pub payment_status: Option<String>,
    pub customer_name: Option<String>,
    pub customer_email: Option<Email>,
}

impl Order {
    /// A draft order written at checkout, before any payment confirmation.
    #[must_use]
    pub fn draft(
        id: OrderId,
        customer_id: CustomerId,
        items: Vec<OrderItem>,
        payment_session_id: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            customer_id,
            items,
            total_amount: None,
            status: None,
            ordered_at: None,
            created_at,
            payment_session_id,
            payment_status: None,
            customer_name: None,
            customer_email: None,
        }
    }

    #[must_use]
    pub const fn lifecycle(&self) -> OrderLifecycle {
        match self.status {
            None => OrderLifecycle::Draft,
            Some(OrderStatus::Canceled) => OrderLifecycle::Canceled,
            Some(_) => OrderLifecycle::Finalized,
        }
    }

    /// Sum of item line totals. Equals the total of a finalized order.
    #[must_use]
    pub fn items_total(&self) -> Decimal {
        self.items.iter().map(|item| item.line_total).sum()
    }

    /// What the processor should have charged for these items, in minor
    /// units: `Σ unit_amount × quantity`, quoted exactly as at checkout.
    #[must_use]
    pub fn expected_charge_minor(&self) -> Option<i64> {
        self.items.iter().try_fold(0_i64, |acc, item| {
            let unit = unit_amount_minor(item.line_total, item.quantity)?;
            acc.checked_add(unit.checked_mul(i64::from(item.quantity))?)
        })
    }

    /// Apply a transition.
    ///
    /// Finalizing overwrites the payment fields unconditionally, so applying
    /// the same finalization twice yields the same order. A redelivered
    /// finalization does not move an order back to `under_review` once an
    /// administrator has advanced it.
    ///
    /// # Errors
    ///
    /// Returns an [`OrderTransitionError`] when the transition is not valid
    /// from the current state or the charged amount does not match the items.
    pub fn apply(&mut self, transition: Transition) -> Result<(), OrderTransitionError> {
        match transition {
            Transition::Finalize(finalization) => self.finalize(finalization),
            Transition::Advance => {
                let status = self.status.ok_or(OrderTransitionError::NotFinalized)?;
                let next = status.next().ok_or(OrderTransitionError::Terminal(status))?;
                self.status = Some(next);
                Ok(())
            }
            Transition::Cancel => match self.status {
                Some(status) if status.is_terminal() => Err(OrderTransitionError::Terminal(status)),
                _ => {
                    self.status = Some(OrderStatus::Canceled);
                    Ok(())
                }
            },
        }
    }

    fn finalize(&mut self, finalization: Finalization) -> Result<(), OrderTransitionError> {
        if self.lifecycle() == OrderLifecycle::Canceled {
            return Err(OrderTransitionError::Canceled);
        }
        let expected = self
            .expected_charge_minor()
            .ok_or(OrderTransitionError::AmountOutOfRange)?;
        if expected != finalization.charged_minor {
            return Err(OrderTransitionError::AmountMismatch {
                expected,
                charged: finalization.charged_minor,
            });
        }

        if self.status.is_none() {
            self.status = Some(OrderStatus::INITIAL);
        }
        self.total_amount = Some(from_minor_units(finalization.charged_minor));
        self.ordered_at = Some(finalization.confirmed_at);
        self.customer_name = finalization.customer_name;
        self.customer_email = Some(finalization.customer_email);
        self.payment_session_id = Some(finalization.payment_session_id);
        self.payment_status = Some(finalization.payment_status);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkout::quote_line;
    use chrono::TimeZone;
    use rust_decimal::dec;

    fn item(quantity: u32, line_total: Decimal) -> OrderItem {
        OrderItem {
            product_id: ProductId::new("x"),
            name: "X".to_string(),
            quantity,
            selected_format: Some("A4".to_string()),
            selected_finishing: Some("Matte".to_string()),
            line_total,
            artwork_fee: None,
        }
    }

    fn draft() -> Order {
        Order::draft(
            OrderId::new("order-1"),
            CustomerId::new("customer-1"),
            vec![item(100, dec!(10.00)), item(3, dec!(4.50))],
            Some("cs_test_1".to_string()),
            Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
        )
    }

    fn finalization(charged_minor: i64) -> Finalization {
        Finalization {
            charged_minor,
            customer_name: Some("Ana Souza".to_string()),
            customer_email: Email::parse("ana@example.com").unwrap(),
            payment_session_id: "cs_test_1".to_string(),
            payment_status: "paid".to_string(),
            confirmed_at: Utc.with_ymd_and_hms(2026, 3, 1, 12, 5, 0).unwrap(),
        }
    }

    #[test]
    fn draft_has_no_status_or_total() {
        let order = draft();
        assert_eq!(order.lifecycle(), OrderLifecycle::Draft);
        assert_eq!(order.total_amount, None);
        assert_eq!(order.items_total(), dec!(14.50));
        assert_eq!(order.expected_charge_minor(), Some(1450));
    }

    #[test]
    fn finalize_sets_initial_status_and_total() {
        let mut order = draft();
        order.apply(Transition::Finalize(finalization(1450))).unwrap();

        assert_eq!(order.lifecycle(), OrderLifecycle::Finalized);
        assert_eq!(order.status, Some(OrderStatus::UnderReview));
        assert_eq!(order.total_amount, Some(dec!(14.50)));
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.customer_email.as_ref().map(Email::as_str), Some("ana@example.com"));
        assert_eq!(order.payment_status.as_deref(), Some("paid"));
    }

    #[test]
    fn finalize_twice_is_idempotent() {
        let mut once = draft();
        once.apply(Transition::Finalize(finalization(1450))).unwrap();

        let mut twice = once.clone();
        twice.apply(Transition::Finalize(finalization(1450))).unwrap();

        assert_eq!(once, twice);
        assert_eq!(twice.items.len(), 2);
    }

    #[test]
    fn redelivery_keeps_admin_progress() {
        let mut order = draft();
        order.apply(Transition::Finalize(finalization(1450))).unwrap();
        order.apply(Transition::Advance).unwrap();
        order.apply(Transition::Finalize(finalization(1450))).unwrap();
        assert_eq!(order.status, Some(OrderStatus::InProduction));
    }

    #[test]
    fn amount_mismatch_leaves_order_untouched() {
        let mut order = draft();
        let before = order.clone();
        let err = order.apply(Transition::Finalize(finalization(999))).unwrap_err();
        assert_eq!(
            err,
            OrderTransitionError::AmountMismatch { expected: 1450, charged: 999 }
        );
        assert_eq!(order, before);
    }

    #[test]
    fn canceled_order_cannot_be_finalized() {
        let mut order = draft();
        order.apply(Transition::Cancel).unwrap();
        assert_eq!(order.lifecycle(), OrderLifecycle::Canceled);
        assert_eq!(
            order.apply(Transition::Finalize(finalization(1450))),
            Err(OrderTransitionError::Canceled)
        );
    }

    #[test]
    fn advance_walks_linear_progression() {
        let mut order = draft();
        assert_eq!(order.apply(Transition::Advance), Err(OrderTransitionError::NotFinalized));

        order.apply(Transition::Finalize(finalization(1450))).unwrap();
        order.apply(Transition::Advance).unwrap();
        order.apply(Transition::Advance).unwrap();
        order.apply(Transition::Advance).unwrap();
        assert_eq!(order.status, Some(OrderStatus::Delivered));
        assert_eq!(
            order.apply(Transition::Advance),
            Err(OrderTransitionError::Terminal(OrderStatus::Delivered))
        );
        assert_eq!(
            order.apply(Transition::Cancel),
            Err(OrderTransitionError::Terminal(OrderStatus::Delivered))
        );
    }

    fn cart_line(quantity: u32, unit_price: Decimal, artwork_fee: Option<Decimal>) -> CartItem {
        CartItem {
            line_id: "x:A4:".to_string(),
            product_id: ProductId::new("x"),
            name: "X".to_string(),
            image_url: None,
            selected_format: Some("A4".to_string()),
            selected_finishing: None,
            quantity,
            unit_price,
            artwork_fee,
        }
    }

    #[test]
    fn snapshot_from_cart_line() {
        let cart_item = cart_line(100, dec!(0.1), Some(dec!(35)));
        let quote = quote_line(&cart_item).unwrap();
        let snapshot = OrderItem::quoted(&cart_item, &quote).unwrap();
        assert_eq!(snapshot.line_total, dec!(45.00));
        assert_eq!(snapshot.artwork_fee, Some(dec!(35)));
    }

    #[test]
    fn fractional_cent_lines_total_what_is_charged() {
        // basePrice 99 over a 1000 tier: 0.099 per unit, 3 units = 0.297,
        // quoted at 10 cents per unit.
        let cart_item = cart_line(3, dec!(0.099), None);
        let quote = quote_line(&cart_item).unwrap();
        assert_eq!(quote.unit_amount, 10);

        let snapshot = OrderItem::quoted(&cart_item, &quote).unwrap();
        assert_eq!(snapshot.line_total, dec!(0.30));

        let mut order = Order::draft(
            OrderId::new("order-2"),
            CustomerId::new("customer-1"),
            vec![snapshot],
            Some("cs_test_2".to_string()),
            Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
        );
        assert_eq!(order.expected_charge_minor(), Some(30));

        order.apply(Transition::Finalize(finalization(30))).unwrap();
        assert_eq!(order.total_amount, Some(order.items_total()));
    }
}

//! Webhook event payloads.
//!
//! Only the fields reconciliation reads are modeled; everything else in the
//! payload is ignored.

use std::collections::HashMap;

use serde::Deserialize;

/// Event type that finalizes an order.
pub const CHECKOUT_SESSION_COMPLETED: &str = "checkout.session.completed";

/// Metadata key carrying the customer id.
pub const METADATA_USER_ID: &str = "userId";
/// Metadata key carrying the draft order id.
pub const METADATA_ORDER_ID: &str = "orderId";
/// Metadata key carrying the compact item summary.
pub const METADATA_ITEMS: &str = "items";

/// A webhook event envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct Event {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    /// Unix seconds.
    pub created: i64,
    pub data: EventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventData {
    pub object: serde_json::Value,
}

/// The `data.object` of a checkout session event.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSessionObject {
    pub id: String,
    /// Amount charged, in minor units.
    pub amount_total: Option<i64>,
    pub payment_status: String,
    pub client_reference_id: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    pub customer_details: Option<CustomerDetails>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CustomerDetails {
    pub email: Option<String>,
    pub name: Option<String>,
}

impl CheckoutSessionObject {
    /// A non-blank metadata value.
    #[must_use]
    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_checkout_completed_event() {
        let payload = r#"{
            "id": "evt_1",
            "type": "checkout.session.completed",
            "created": 1767225600,
            "data": {"object": {
                "id": "cs_test_1",
                "object": "checkout.session",
                "amount_total": 1450,
                "payment_status": "paid",
                "client_reference_id": "customer-1",
                "metadata": {"userId": "customer-1", "orderId": "order-1", "items": "x:100"},
                "customer_details": {"email": "ana@example.com", "name": "Ana Souza"}
            }}
        }"#;
        let event: Event = serde_json::from_str(payload).unwrap();
        assert_eq!(event.event_type, CHECKOUT_SESSION_COMPLETED);

        let session: CheckoutSessionObject = serde_json::from_value(event.data.object).unwrap();
        assert_eq!(session.amount_total, Some(1450));
        assert_eq!(session.metadata_value(METADATA_ORDER_ID), Some("order-1"));
        assert_eq!(
            session.customer_details.and_then(|d| d.name).as_deref(),
            Some("Ana Souza")
        );
    }

    #[test]
    fn blank_metadata_counts_as_missing() {
        let session: CheckoutSessionObject = serde_json::from_str(
            r#"{"id":"cs_1","amount_total":1,"payment_status":"paid","metadata":{"orderId":"  "}}"#,
        )
        .unwrap();
        assert_eq!(session.metadata_value(METADATA_ORDER_ID), None);
        assert_eq!(session.metadata_value(METADATA_USER_ID), None);
    }
}

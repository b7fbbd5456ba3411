//! Stripe Checkout Sessions client.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use url::Url;

use graphica_core::LineQuote;

use super::PaymentError;
use super::events::{METADATA_ITEMS, METADATA_ORDER_ID, METADATA_USER_ID};
use crate::config::StripeConfig;

/// Input for a hosted checkout session.
#[derive(Debug, Clone)]
pub struct CheckoutSessionRequest<'a> {
    pub lines: &'a [LineQuote],
    /// Reconciliation key; also sent as `client_reference_id`.
    pub customer_id: &'a str,
    pub customer_email: &'a str,
    pub order_id: &'a str,
    /// Compact item summary, already bounded to the metadata limit.
    pub items_summary: &'a str,
    pub success_url: &'a str,
    pub cancel_url: &'a str,
}

/// A created session: its id and the hosted page to redirect to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSession {
    #[serde(alias = "id")]
    pub session_id: String,
    pub url: Option<String>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
}

/// Stripe REST client.
#[derive(Clone)]
pub struct StripeClient {
    client: reqwest::Client,
    api_base: Url,
    secret_key: SecretString,
    currency: String,
}

impl StripeClient {
    /// Create a new Stripe client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &StripeConfig) -> Result<Self, PaymentError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(20))
            .build()?;

        Ok(Self {
            client,
            api_base: config.api_base.clone(),
            secret_key: config.secret_key.clone(),
            currency: config.currency.clone(),
        })
    }

    /// Create a hosted checkout session in payment mode.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Api` with the processor's message when Stripe
    /// rejects the request, or `PaymentError::Http` when it is unreachable.
    pub async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest<'_>,
    ) -> Result<CheckoutSession, PaymentError> {
        let url = self
            .api_base
            .join("/v1/checkout/sessions")
            .map_err(|e| PaymentError::Parse(e.to_string()))?;
        let form = session_form(&self.currency, request);

        let response = self
            .client
            .post(url)
            .bearer_auth(self.secret_key.expose_secret())
            .form(&form)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .ok()
                .and_then(|b| b.error.message)
                .unwrap_or(body);
            return Err(PaymentError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<CheckoutSession>()
            .await
            .map_err(|e| PaymentError::Parse(e.to_string()))
    }
}

/// Encode a session request as Stripe's bracketed form fields.
fn session_form(currency: &str, request: &CheckoutSessionRequest<'_>) -> Vec<(String, String)> {
    let mut form = vec![
        ("mode".to_string(), "payment".to_string()),
        ("success_url".to_string(), request.success_url.to_string()),
        ("cancel_url".to_string(), request.cancel_url.to_string()),
        ("client_reference_id".to_string(), request.customer_id.to_string()),
        ("customer_email".to_string(), request.customer_email.to_string()),
        (format!("metadata[{METADATA_USER_ID}]"), request.customer_id.to_string()),
        (format!("metadata[{METADATA_ORDER_ID}]"), request.order_id.to_string()),
        (format!("metadata[{METADATA_ITEMS}]"), request.items_summary.to_string()),
    ];

    for (i, line) in request.lines.iter().enumerate() {
        let prefix = format!("line_items[{i}]");
        form.push((format!("{prefix}[quantity]"), line.quantity.to_string()));
        form.push((format!("{prefix}[price_data][currency]"), currency.to_string()));
        form.push((
            format!("{prefix}[price_data][unit_amount]"),
            line.unit_amount.to_string(),
        ));
        form.push((
            format!("{prefix}[price_data][product_data][name]"),
            line.name.clone(),
        ));
        if let Some(description) = &line.description {
            form.push((
                format!("{prefix}[price_data][product_data][description]"),
                description.clone(),
            ));
        }
        if let Some(image) = &line.image {
            form.push((
                format!("{prefix}[price_data][product_data][images][0]"),
                image.clone(),
            ));
        }
    }
    form
}

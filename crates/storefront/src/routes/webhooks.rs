//! Payment processor webhooks.
//!
//! The processor retries anything that is not a 2xx, so the status code is
//! the contract: integrity failures get a 4xx (retrying will not help),
//! internal failures a 5xx (retrying might).

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use secrecy::ExposeSecret;
use tracing::instrument;

use crate::services::{WebhookError, WebhookOutcome, WebhookService};
use crate::state::AppState;

/// Header carrying the delivery signature.
pub const SIGNATURE_HEADER: &str = "stripe-signature";

/// Receive a Stripe event.
#[instrument(skip_all)]
pub async fn stripe(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());
    let secret = state.config().stripe.webhook_secret.expose_secret();

    match WebhookService::new(state.pool(), secret)
        .handle(&body, signature, Utc::now())
        .await
    {
        Ok(outcome) => {
            if let WebhookOutcome::Ignored(event_type) = &outcome {
                tracing::debug!(%event_type, "Acknowledged unhandled event");
            }
            (StatusCode::OK, Json(serde_json::json!({ "received": true }))).into_response()
        }
        Err(err) => rejection(&err),
    }
}

fn rejection(err: &WebhookError) -> Response {
    let status = match err {
        WebhookError::CustomerNotFound(_) | WebhookError::OrderNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        WebhookError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::BAD_REQUEST,
    };

    let message = if err.needs_attention() {
        let event_id = sentry::capture_error(err);
        tracing::error!(error = %err, sentry_event_id = %event_id, "Paid order left unfinalized");
        err.to_string()
    } else if err.is_integrity() {
        tracing::warn!(error = %err, "Webhook rejected");
        err.to_string()
    } else {
        let event_id = sentry::capture_error(err);
        tracing::error!(error = %err, sentry_event_id = %event_id, "Webhook reconciliation failed");
        "Internal server error".to_string()
    };

    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, http::Request};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use crate::config::tests::test_config;
    use crate::payments::sign;

    const WEBHOOK_SECRET: &str = "whsec_Gx7pQ2mK9vL4tR8nB3cJ6yH1";

    /// Router over a pool that never connects; requests under test must be
    /// rejected before any query runs.
    fn app() -> Router {
        let config = test_config();
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/graphica_test")
            .unwrap();
        let state = AppState::new(config, pool).unwrap();
        crate::routes::routes().with_state(state)
    }

    fn request(payload: &str, signature: Option<String>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/webhooks/stripe")
            .header("content-type", "application/json");
        if let Some(signature) = signature {
            builder = builder.header(SIGNATURE_HEADER, signature);
        }
        builder.body(Body::from(payload.to_owned())).unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn completed_event(metadata: &serde_json::Value) -> String {
        serde_json::json!({
            "id": "evt_1",
            "type": "checkout.session.completed",
            "created": 1_700_000_000,
            "data": { "object": {
                "id": "cs_test_1",
                "amount_total": 1450,
                "payment_status": "paid",
                "metadata": metadata,
            }}
        })
        .to_string()
    }

    #[tokio::test]
    async fn missing_signature_is_bad_request() {
        let payload = completed_event(&serde_json::json!({ "userId": "c1", "orderId": "o1" }));
        let response = app().oneshot(request(&payload, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn forged_signature_is_bad_request() {
        let payload = completed_event(&serde_json::json!({ "userId": "c1", "orderId": "o1" }));
        let signature = sign("whsec_someone_else_entirely", payload.as_bytes(), Utc::now().timestamp());

        let response = app()
            .oneshot(request(&payload, Some(signature)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("signature"));
    }

    #[tokio::test]
    async fn missing_order_id_is_rejected_before_any_write() {
        let payload = completed_event(&serde_json::json!({ "userId": "c1" }));
        let signature = sign(WEBHOOK_SECRET, payload.as_bytes(), Utc::now().timestamp());

        let response = app()
            .oneshot(request(&payload, Some(signature)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "missing orderId metadata");
    }

    #[tokio::test]
    async fn unrelated_events_are_acknowledged() {
        let payload = serde_json::json!({
            "id": "evt_2",
            "type": "payment_intent.created",
            "created": 1_700_000_000,
            "data": { "object": {} }
        })
        .to_string();
        let signature = sign(WEBHOOK_SECRET, payload.as_bytes(), Utc::now().timestamp());

        let response = app()
            .oneshot(request(&payload, Some(signature)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, serde_json::json!({ "received": true }));
    }

    #[test]
    fn rejection_statuses() {
        use graphica_core::{CustomerId, OrderId, OrderTransitionError};

        let status = |err: WebhookError| rejection(&err).status();
        assert_eq!(
            status(WebhookError::CustomerNotFound(CustomerId::new("c1"))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status(WebhookError::OrderNotFound(OrderId::new("o1"))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status(WebhookError::Rejected(
                OrderId::new("o1"),
                OrderTransitionError::AmountMismatch {
                    expected: 1450,
                    charged: 100
                }
            )),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(WebhookError::OwnerMismatch {
                order: OrderId::new("o1"),
                customer: CustomerId::new("c2"),
            }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(WebhookError::Internal(crate::db::RepositoryError::DataCorruption(
                "bad row".to_string()
            ))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}

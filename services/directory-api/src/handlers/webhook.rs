//! Stripe webhook handler

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;
use std::time::Instant;

use crate::error::{ApiError, ApiResult};
use crate::handlers::shared::require_billing;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
}

/// POST /webhooks/stripe
///
/// Verify the delivery signature over the raw body, then reconcile the
/// event into the entitlement store. Stale and irrelevant events still
/// acknowledge with 200 so the processor stops retrying them.
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<WebhookAck>> {
    let start = Instant::now();

    let billing = require_billing(&state)?;

    let signature = headers
        .get("stripe-signature")
        .ok_or_else(|| {
            tracing::warn!("Missing Stripe-Signature header");
            ApiError::BadRequest("Missing Stripe-Signature header".to_string())
        })?
        .to_str()
        .map_err(|_| {
            tracing::warn!("Invalid Stripe-Signature header encoding");
            ApiError::BadRequest("Invalid Stripe-Signature header encoding".to_string())
        })?;

    match billing.process_webhook(&body, signature).await {
        Ok(outcome) => {
            metrics::counter!("directory_webhooks_processed_total", "status" => outcome.as_str())
                .increment(1);
            metrics::histogram!(
                "directory_operation_duration_seconds",
                "operation" => "process_webhook"
            )
            .record(start.elapsed().as_secs_f64());

            tracing::info!(outcome = outcome.as_str(), "Webhook processed");

            Ok(Json(WebhookAck { received: true }))
        }
        Err(e) => {
            tracing::error!(error = ?e, "Webhook processing failed");
            metrics::counter!("directory_webhooks_processed_total", "status" => "error")
                .increment(1);

            Err(e.into())
        }
    }
}

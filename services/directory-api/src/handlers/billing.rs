//! Billing handlers
//!
//! Checkout and portal sessions require the payment processor to be
//! configured; subscription state reads come straight from the
//! entitlement store and work either way.

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use spindex_auth_core::is_entitled;
use spindex_db::SubscriptionRepository;

use crate::error::{ApiError, ApiResult};
use crate::extractors::AuthUser;
use crate::handlers::shared::{require_billing, validate_required};
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateCheckoutRequest {
    pub price_id: String,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub session_id: String,
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct PortalResponse {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct SubscriptionResponse {
    pub entitled: bool,
    pub status: Option<String>,
    pub plan: Option<String>,
    pub current_period_end: Option<DateTime<Utc>>,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/billing/checkout
pub async fn create_checkout(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateCheckoutRequest>,
) -> ApiResult<Json<CheckoutResponse>> {
    let start = Instant::now();

    validate_required(&req.price_id, "price_id")?;
    let billing = require_billing(&state)?;

    let session = billing.create_checkout(&auth.user_id, &req.price_id).await?;

    metrics::counter!("directory_checkouts_created_total").increment(1);
    metrics::histogram!("directory_operation_duration_seconds", "operation" => "create_checkout")
        .record(start.elapsed().as_secs_f64());

    tracing::info!(user_id = %auth.user_id, "Checkout session created");

    Ok(Json(CheckoutResponse {
        session_id: session.session_id,
        url: session.url,
    }))
}

/// POST /api/v1/billing/portal
pub async fn create_portal(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<PortalResponse>> {
    let start = Instant::now();

    let billing = require_billing(&state)?;

    let url = billing.create_portal(&auth.user_id).await.map_err(|e| {
        if e.is_not_found() {
            ApiError::CustomerNotFound
        } else {
            e.into()
        }
    })?;

    metrics::histogram!("directory_operation_duration_seconds", "operation" => "create_portal")
        .record(start.elapsed().as_secs_f64());

    Ok(Json(PortalResponse { url }))
}

/// GET /api/v1/billing/subscription
///
/// The caller's own entitlement state. Users with no record at all get
/// `entitled: false` with null status rather than a 404.
pub async fn get_subscription(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<SubscriptionResponse>> {
    let record = state.repos.subscriptions.get(auth.user_id.as_str()).await?;
    let entitlement = record.map(|r| r.to_entitlement());

    Ok(Json(SubscriptionResponse {
        entitled: is_entitled(entitlement.as_ref()),
        status: entitlement.as_ref().map(|e| e.status.as_str().to_string()),
        plan: entitlement
            .as_ref()
            .and_then(|e| e.plan.map(|p| p.as_str().to_string())),
        current_period_end: entitlement.and_then(|e| e.current_period_end),
    }))
}

//! Signed webhook payload builders for testing

use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;

/// Webhook signing secret shared by the test services
pub const WEBHOOK_SECRET: &str = "whsec_test_secret";

/// Generate a valid Stripe webhook signature for a payload
pub fn sign(payload: &str, timestamp: i64) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(WEBHOOK_SECRET.as_bytes()).unwrap();
    mac.update(format!("{timestamp}.{payload}").as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());
    format!("t={timestamp},v1={signature}")
}

/// Build a `customer.subscription.*` event payload
pub fn subscription_event_payload(
    event_id: &str,
    event_type: &str,
    subscription_id: &str,
    customer_id: &str,
    status: &str,
    price_id: &str,
    created: i64,
) -> String {
    serde_json::json!({
        "id": event_id,
        "type": event_type,
        "created": created,
        "data": {
            "object": {
                "id": subscription_id,
                "customer": customer_id,
                "status": status,
                "current_period_end": Utc::now().timestamp() + 30 * 24 * 60 * 60,
                "cancel_at_period_end": false,
                "items": {
                    "data": [{"id": "si_1", "price": {"id": price_id}}],
                    "has_more": false
                }
            }
        }
    })
    .to_string()
}

/// Build a `checkout.session.completed` event payload
pub fn checkout_completed_payload(
    event_id: &str,
    customer_id: &str,
    subscription_id: Option<&str>,
    user_id: Option<&str>,
    created: i64,
) -> String {
    let mut object = serde_json::json!({
        "id": "cs_test_1",
        "customer": customer_id,
        "subscription": subscription_id,
    });
    if let Some(uid) = user_id {
        object["metadata"] = serde_json::json!({"user_id": uid});
    }
    serde_json::json!({
        "id": event_id,
        "type": "checkout.session.completed",
        "created": created,
        "data": {"object": object}
    })
    .to_string()
}

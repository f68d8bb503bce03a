//! Stripe webhook handling
//!
//! Verifies the `stripe-signature` header and parses the lifecycle
//! events the reconciler consumes. Verification always precedes
//! parsing; an unsigned payload never reaches event handling.

use chrono::{DateTime, TimeZone, Utc};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use tracing::{debug, error, info, instrument, warn};

use crate::error::BillingError;
use crate::stripe::{StripeCheckoutSession, StripeSubscription, CUSTOMER_USER_ID_KEY};

/// Maximum age (and future skew) tolerated for a signed timestamp
const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// Webhook event types we handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEventType {
    /// Checkout session completed
    CheckoutSessionCompleted,
    /// Customer subscription created
    CustomerSubscriptionCreated,
    /// Customer subscription updated
    CustomerSubscriptionUpdated,
    /// Customer subscription deleted
    CustomerSubscriptionDeleted,
    /// Unknown event type
    Unknown(String),
}

impl From<&str> for WebhookEventType {
    fn from(s: &str) -> Self {
        match s {
            "checkout.session.completed" => Self::CheckoutSessionCompleted,
            "customer.subscription.created" => Self::CustomerSubscriptionCreated,
            "customer.subscription.updated" => Self::CustomerSubscriptionUpdated,
            "customer.subscription.deleted" => Self::CustomerSubscriptionDeleted,
            other => Self::Unknown(other.to_string()),
        }
    }
}

/// Parsed webhook event
#[derive(Debug, Clone)]
pub struct WebhookEvent {
    /// Event ID
    pub id: String,
    /// Event type
    pub event_type: WebhookEventType,
    /// Event data
    pub data: WebhookEventData,
    /// When the event was created (Unix timestamp)
    pub created: i64,
}

impl WebhookEvent {
    /// Event creation time as a timestamp, if representable
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.created, 0).single()
    }
}

/// Webhook event data
#[derive(Debug, Clone)]
pub enum WebhookEventData {
    /// Checkout session data
    CheckoutSession(CheckoutSessionData),
    /// Subscription data
    Subscription(SubscriptionEventData),
    /// Raw JSON for unknown events
    Raw(serde_json::Value),
}

/// Checkout session completed data
#[derive(Debug, Clone)]
pub struct CheckoutSessionData {
    /// Session ID
    pub session_id: String,
    /// Customer ID
    pub customer_id: Option<String>,
    /// Subscription ID
    pub subscription_id: Option<String>,
    /// Our user id from the session metadata
    pub user_id: Option<String>,
}

/// Subscription event data
#[derive(Debug, Clone)]
pub struct SubscriptionEventData {
    /// Subscription ID
    pub subscription_id: String,
    /// Customer ID
    pub customer_id: String,
    /// Status as reported by the processor
    pub status: String,
    /// Price ID of the first subscription item
    pub price_id: Option<String>,
    /// Current period end
    pub current_period_end: DateTime<Utc>,
    /// Whether it cancels at period end
    pub cancel_at_period_end: bool,
}

/// Webhook handler for verifying and parsing Stripe events
#[derive(Clone)]
pub struct WebhookHandler {
    webhook_secret: String,
}

impl WebhookHandler {
    /// Create a new webhook handler
    pub fn new(webhook_secret: impl Into<String>) -> Self {
        Self {
            webhook_secret: webhook_secret.into(),
        }
    }

    /// Verify and parse a webhook payload
    #[instrument(skip(self, payload, signature))]
    pub fn verify_and_parse(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<WebhookEvent, BillingError> {
        self.verify_signature(payload, signature)?;

        let raw_event: RawStripeEvent = serde_json::from_slice(payload)
            .map_err(|e| BillingError::WebhookError(format!("malformed event: {e}")))?;

        debug!(event_id = %raw_event.id, event_type = %raw_event.event_type, "Parsed webhook event");

        let event_type = WebhookEventType::from(raw_event.event_type.as_str());
        let data = Self::parse_event_data(&event_type, raw_event.data.object)?;

        Ok(WebhookEvent {
            id: raw_event.id,
            event_type,
            data,
            created: raw_event.created,
        })
    }

    /// Verify Stripe webhook signature
    ///
    /// Header format is `t=<unix ts>,v1=<hex hmac-sha256 of "ts.body">`.
    fn verify_signature(&self, payload: &[u8], signature: &str) -> Result<(), BillingError> {
        let mut timestamp: Option<&str> = None;
        let mut sig_v1: Option<&str> = None;

        for part in signature.split(',') {
            if let Some((key, value)) = part.split_once('=') {
                match key.trim() {
                    "t" => timestamp = Some(value),
                    "v1" => sig_v1 = Some(value),
                    _ => {}
                }
            }
        }

        let timestamp = timestamp.ok_or_else(|| {
            warn!("Missing timestamp in webhook signature");
            BillingError::WebhookError("missing signature timestamp".to_string())
        })?;

        let sig_v1 = sig_v1.ok_or_else(|| {
            warn!("Missing v1 signature in webhook signature");
            BillingError::WebhookError("missing v1 signature".to_string())
        })?;

        let mut mac = Hmac::<Sha256>::new_from_slice(self.webhook_secret.as_bytes())
            .map_err(|_| BillingError::Internal("HMAC key error".to_string()))?;
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(payload);
        let expected = hex::encode(mac.finalize().into_bytes());

        if !constant_time_eq(sig_v1.as_bytes(), expected.as_bytes()) {
            error!("Webhook signature verification failed");
            return Err(BillingError::WebhookError(
                "signature verification failed".to_string(),
            ));
        }

        let ts: i64 = timestamp.parse().map_err(|_| {
            BillingError::WebhookError("invalid signature timestamp".to_string())
        })?;
        let now = Utc::now().timestamp();
        if (now - ts).abs() > SIGNATURE_TOLERANCE_SECS {
            warn!(timestamp = ts, now = now, "Webhook timestamp outside tolerance");
            return Err(BillingError::WebhookError(
                "signature timestamp outside tolerance".to_string(),
            ));
        }

        Ok(())
    }

    /// Parse event data based on type
    fn parse_event_data(
        event_type: &WebhookEventType,
        object: serde_json::Value,
    ) -> Result<WebhookEventData, BillingError> {
        match event_type {
            WebhookEventType::CheckoutSessionCompleted => {
                let session: StripeCheckoutSession = serde_json::from_value(object)
                    .map_err(|e| BillingError::WebhookError(e.to_string()))?;
                let user_id = session.metadata.get(CUSTOMER_USER_ID_KEY).cloned();
                Ok(WebhookEventData::CheckoutSession(CheckoutSessionData {
                    session_id: session.id,
                    customer_id: session.customer,
                    subscription_id: session.subscription,
                    user_id,
                }))
            }
            WebhookEventType::CustomerSubscriptionCreated
            | WebhookEventType::CustomerSubscriptionUpdated
            | WebhookEventType::CustomerSubscriptionDeleted => {
                let sub: StripeSubscription = serde_json::from_value(object)
                    .map_err(|e| BillingError::WebhookError(e.to_string()))?;
                let current_period_end = Utc
                    .timestamp_opt(sub.current_period_end, 0)
                    .single()
                    .ok_or_else(|| {
                        BillingError::WebhookError("invalid period end timestamp".to_string())
                    })?;
                Ok(WebhookEventData::Subscription(SubscriptionEventData {
                    price_id: sub.price_id().map(str::to_string),
                    subscription_id: sub.id,
                    customer_id: sub.customer,
                    status: sub.status,
                    current_period_end,
                    cancel_at_period_end: sub.cancel_at_period_end,
                }))
            }
            WebhookEventType::Unknown(name) => {
                info!(event_type = %name, "Received unknown webhook event type");
                Ok(WebhookEventData::Raw(object))
            }
        }
    }
}

/// Constant-time comparison
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0, |acc, (x, y)| acc | (x ^ y)) == 0
}

// Raw Stripe event envelope

#[derive(Debug, Deserialize)]
struct RawStripeEvent {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    data: RawEventData,
    created: i64,
}

#[derive(Debug, Deserialize)]
struct RawEventData {
    object: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SECRET: &str = "whsec_test_secret";

    fn sign(payload: &str, timestamp: i64) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(SECRET.as_bytes()).unwrap();
        mac.update(format!("{timestamp}.{payload}").as_bytes());
        let sig = hex::encode(mac.finalize().into_bytes());
        format!("t={timestamp},v1={sig}")
    }

    fn subscription_event(event_type: &str) -> String {
        json!({
            "id": "evt_1",
            "type": event_type,
            "created": Utc::now().timestamp(),
            "data": {
                "object": {
                    "id": "sub_1",
                    "customer": "cus_1",
                    "status": "active",
                    "current_period_end": Utc::now().timestamp() + 86_400,
                    "cancel_at_period_end": false,
                    "items": {
                        "data": [{"id": "si_1", "price": {"id": "price_m"}}],
                        "has_more": false
                    }
                }
            }
        })
        .to_string()
    }

    #[test]
    fn test_valid_signature_parses_event() {
        let handler = WebhookHandler::new(SECRET);
        let payload = subscription_event("customer.subscription.updated");
        let signature = sign(&payload, Utc::now().timestamp());

        let event = handler
            .verify_and_parse(payload.as_bytes(), &signature)
            .unwrap();
        assert_eq!(
            event.event_type,
            WebhookEventType::CustomerSubscriptionUpdated
        );
        match event.data {
            WebhookEventData::Subscription(data) => {
                assert_eq!(data.subscription_id, "sub_1");
                assert_eq!(data.customer_id, "cus_1");
                assert_eq!(data.price_id.as_deref(), Some("price_m"));
            }
            other => panic!("unexpected event data: {other:?}"),
        }
    }

    #[test]
    fn test_rejects_tampered_payload() {
        let handler = WebhookHandler::new(SECRET);
        let payload = subscription_event("customer.subscription.updated");
        let signature = sign(&payload, Utc::now().timestamp());

        let tampered = payload.replace("cus_1", "cus_2");
        let err = handler
            .verify_and_parse(tampered.as_bytes(), &signature)
            .unwrap_err();
        assert!(matches!(err, BillingError::WebhookError(_)));
    }

    #[test]
    fn test_rejects_wrong_secret() {
        let handler = WebhookHandler::new("whsec_other");
        let payload = subscription_event("customer.subscription.updated");
        let signature = sign(&payload, Utc::now().timestamp());

        assert!(handler
            .verify_and_parse(payload.as_bytes(), &signature)
            .is_err());
    }

    #[test]
    fn test_rejects_malformed_header() {
        let handler = WebhookHandler::new(SECRET);
        let payload = subscription_event("customer.subscription.updated");

        assert!(handler
            .verify_and_parse(payload.as_bytes(), "garbage")
            .is_err());
        assert!(handler
            .verify_and_parse(payload.as_bytes(), "t=123")
            .is_err());
        assert!(handler
            .verify_and_parse(payload.as_bytes(), "v1=abcd")
            .is_err());
    }

    #[test]
    fn test_rejects_stale_timestamp() {
        let handler = WebhookHandler::new(SECRET);
        let payload = subscription_event("customer.subscription.updated");
        let stale = Utc::now().timestamp() - SIGNATURE_TOLERANCE_SECS - 60;
        let signature = sign(&payload, stale);

        let err = handler
            .verify_and_parse(payload.as_bytes(), &signature)
            .unwrap_err();
        assert!(matches!(err, BillingError::WebhookError(_)));
    }

    #[test]
    fn test_rejects_future_timestamp() {
        let handler = WebhookHandler::new(SECRET);
        let payload = subscription_event("customer.subscription.updated");
        let future = Utc::now().timestamp() + SIGNATURE_TOLERANCE_SECS + 60;
        let signature = sign(&payload, future);

        assert!(handler
            .verify_and_parse(payload.as_bytes(), &signature)
            .is_err());
    }

    #[test]
    fn test_checkout_session_carries_user_metadata() {
        let handler = WebhookHandler::new(SECRET);
        let payload = json!({
            "id": "evt_2",
            "type": "checkout.session.completed",
            "created": Utc::now().timestamp(),
            "data": {
                "object": {
                    "id": "cs_1",
                    "customer": "cus_1",
                    "subscription": "sub_1",
                    "metadata": {"user_id": "user_42"}
                }
            }
        })
        .to_string();
        let signature = sign(&payload, Utc::now().timestamp());

        let event = handler
            .verify_and_parse(payload.as_bytes(), &signature)
            .unwrap();
        match event.data {
            WebhookEventData::CheckoutSession(data) => {
                assert_eq!(data.user_id.as_deref(), Some("user_42"));
                assert_eq!(data.subscription_id.as_deref(), Some("sub_1"));
            }
            other => panic!("unexpected event data: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_event_parses_to_raw() {
        let handler = WebhookHandler::new(SECRET);
        let payload = json!({
            "id": "evt_3",
            "type": "invoice.paid",
            "created": Utc::now().timestamp(),
            "data": {"object": {"id": "in_1"}}
        })
        .to_string();
        let signature = sign(&payload, Utc::now().timestamp());

        let event = handler
            .verify_and_parse(payload.as_bytes(), &signature)
            .unwrap();
        assert_eq!(
            event.event_type,
            WebhookEventType::Unknown("invoice.paid".to_string())
        );
        assert!(matches!(event.data, WebhookEventData::Raw(_)));
    }
}

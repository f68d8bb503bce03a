//! Webhook delivery contract tests
//!
//! Exercises the signed-delivery format the webhook endpoint accepts,
//! as the payment processor would actually send it: raw body bytes
//! plus a `stripe-signature` header value.

use chrono::Utc;
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;

use spindex_billing_core::{WebhookEventType, WebhookHandler};

const SECRET: &str = "whsec_directory_test";

fn sign_with(secret: &str, payload: &str, timestamp: i64) -> String {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(format!("{timestamp}.{payload}").as_bytes());
    format!("t={timestamp},v1={}", hex::encode(mac.finalize().into_bytes()))
}

fn lifecycle_payload(event_type: &str) -> String {
    json!({
        "id": "evt_delivery_1",
        "type": event_type,
        "created": Utc::now().timestamp(),
        "data": {
            "object": {
                "id": "sub_9",
                "customer": "cus_9",
                "status": "active",
                "current_period_end": Utc::now().timestamp() + 30 * 86_400,
                "cancel_at_period_end": false,
                "items": {
                    "data": [{"id": "si_9", "price": {"id": "price_pro"}}],
                    "has_more": false
                }
            }
        }
    })
    .to_string()
}

#[test]
fn delivery_with_valid_signature_is_accepted() {
    let handler = WebhookHandler::new(SECRET);
    let payload = lifecycle_payload("customer.subscription.updated");
    let header = sign_with(SECRET, &payload, Utc::now().timestamp());

    let event = handler
        .verify_and_parse(payload.as_bytes(), &header)
        .expect("signed delivery should verify");
    assert_eq!(event.event_type, WebhookEventType::CustomerSubscriptionUpdated);
}

#[test]
fn every_handled_lifecycle_event_verifies() {
    let handler = WebhookHandler::new(SECRET);
    let cases = [
        (
            "customer.subscription.created",
            WebhookEventType::CustomerSubscriptionCreated,
        ),
        (
            "customer.subscription.updated",
            WebhookEventType::CustomerSubscriptionUpdated,
        ),
        (
            "customer.subscription.deleted",
            WebhookEventType::CustomerSubscriptionDeleted,
        ),
    ];

    for (name, expected) in cases {
        let payload = lifecycle_payload(name);
        let header = sign_with(SECRET, &payload, Utc::now().timestamp());
        let event = handler
            .verify_and_parse(payload.as_bytes(), &header)
            .expect("signed delivery should verify");
        assert_eq!(event.event_type, expected, "event type for {name}");
    }
}

#[test]
fn header_with_spaces_after_commas_is_accepted() {
    // Some HTTP stacks reassemble the header with whitespace after the
    // separator; Stripe's own SDKs tolerate it
    let handler = WebhookHandler::new(SECRET);
    let payload = lifecycle_payload("customer.subscription.updated");
    let ts = Utc::now().timestamp();
    let header = sign_with(SECRET, &payload, ts).replace(",v1=", ", v1=");

    assert!(handler.verify_and_parse(payload.as_bytes(), &header).is_ok());
}

#[test]
fn header_with_extra_scheme_entries_is_accepted() {
    // Stripe appends older scheme signatures (v0) alongside v1
    let handler = WebhookHandler::new(SECRET);
    let payload = lifecycle_payload("customer.subscription.updated");
    let header = format!(
        "{},v0=0000000000000000000000000000000000000000000000000000000000000000",
        sign_with(SECRET, &payload, Utc::now().timestamp())
    );

    assert!(handler.verify_and_parse(payload.as_bytes(), &header).is_ok());
}

#[test]
fn delivery_resigned_under_another_secret_is_rejected() {
    // An attacker who never held the endpoint secret cannot produce an
    // acceptable signature, even a self-consistent one
    let handler = WebhookHandler::new(SECRET);
    let payload = lifecycle_payload("customer.subscription.deleted");
    let forged = sign_with("whsec_attacker", &payload, Utc::now().timestamp());

    assert!(handler.verify_and_parse(payload.as_bytes(), &forged).is_err());
}

#[test]
fn replayed_delivery_outside_tolerance_is_rejected() {
    let handler = WebhookHandler::new(SECRET);
    let payload = lifecycle_payload("customer.subscription.updated");
    let replayed = sign_with(SECRET, &payload, Utc::now().timestamp() - 400);

    assert!(handler.verify_and_parse(payload.as_bytes(), &replayed).is_err());
}

#[test]
fn recent_delivery_within_tolerance_is_accepted() {
    let handler = WebhookHandler::new(SECRET);
    let payload = lifecycle_payload("customer.subscription.updated");
    let delayed = sign_with(SECRET, &payload, Utc::now().timestamp() - 250);

    assert!(handler.verify_and_parse(payload.as_bytes(), &delayed).is_ok());
}

#[test]
fn body_mutation_after_signing_is_rejected() {
    let handler = WebhookHandler::new(SECRET);
    let payload = lifecycle_payload("customer.subscription.updated");
    let header = sign_with(SECRET, &payload, Utc::now().timestamp());

    let mutated = payload.replace("\"status\":\"active\"", "\"status\":\"canceled\"");
    assert_ne!(payload, mutated, "mutation must change the body");
    assert!(handler.verify_and_parse(mutated.as_bytes(), &header).is_err());
}

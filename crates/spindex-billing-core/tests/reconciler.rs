//! Entitlement reconciliation integration tests
//!
//! Drive signed webhook deliveries through the billing service and
//! check what lands in the entitlement store.

mod common;

use std::sync::Arc;

use chrono::Utc;

use spindex_billing_core::{BillingConfig, BillingService, ReconcileOutcome};
use spindex_db::SubscriptionRepository;
use spindex_types::{Plan, UserId};

use common::events::{checkout_completed_payload, sign, subscription_event_payload, WEBHOOK_SECRET};
use common::mocks::{MockPaymentProvider, MockSubscriptionRepository};

fn config() -> BillingConfig {
    BillingConfig::new("sk_test", WEBHOOK_SECRET, "https://app.test")
        .with_price(Plan::ProMonthly, "price_m")
        .with_price(Plan::ProAnnual, "price_a")
}

fn service(
    repo: Arc<MockSubscriptionRepository>,
    provider: Arc<MockPaymentProvider>,
) -> BillingService<MockSubscriptionRepository, MockPaymentProvider> {
    BillingService::new(repo, provider, config())
}

async fn deliver(
    billing: &BillingService<MockSubscriptionRepository, MockPaymentProvider>,
    payload: &str,
) -> ReconcileOutcome {
    let signature = sign(payload, Utc::now().timestamp());
    billing
        .process_webhook(payload.as_bytes(), &signature)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_subscription_updated_creates_entitlement() {
    let repo = Arc::new(MockSubscriptionRepository::new());
    let provider = Arc::new(MockPaymentProvider::new());
    provider.insert_customer("cus_1", Some("user_1"));
    let billing = service(repo.clone(), provider);

    let payload = subscription_event_payload(
        "evt_1",
        "customer.subscription.updated",
        "sub_1",
        "cus_1",
        "active",
        "price_m",
        Utc::now().timestamp(),
    );
    let outcome = deliver(&billing, &payload).await;

    assert_eq!(outcome, ReconcileOutcome::Applied);
    let row = repo.get("user_1").await.unwrap().unwrap();
    assert_eq!(row.status, "active");
    assert_eq!(row.plan.as_deref(), Some("pro_monthly"));
    assert_eq!(row.stripe_subscription_id.as_deref(), Some("sub_1"));
    assert!(row.last_event_at.is_some());
}

#[tokio::test]
async fn test_redelivery_is_idempotent() {
    let repo = Arc::new(MockSubscriptionRepository::new());
    let provider = Arc::new(MockPaymentProvider::new());
    provider.insert_customer("cus_1", Some("user_1"));
    let billing = service(repo.clone(), provider);

    let payload = subscription_event_payload(
        "evt_1",
        "customer.subscription.created",
        "sub_1",
        "cus_1",
        "active",
        "price_a",
        Utc::now().timestamp(),
    );

    assert_eq!(deliver(&billing, &payload).await, ReconcileOutcome::Applied);
    let first = repo.get("user_1").await.unwrap().unwrap();

    // An equal timestamp re-applies the identical snapshot.
    assert_eq!(deliver(&billing, &payload).await, ReconcileOutcome::Applied);
    let second = repo.get("user_1").await.unwrap().unwrap();

    assert_eq!(first.status, second.status);
    assert_eq!(first.plan, second.plan);
    assert_eq!(first.current_period_end, second.current_period_end);
    assert_eq!(first.last_event_at, second.last_event_at);
}

#[tokio::test]
async fn test_stale_event_is_skipped() {
    let repo = Arc::new(MockSubscriptionRepository::new());
    let provider = Arc::new(MockPaymentProvider::new());
    provider.insert_customer("cus_1", Some("user_1"));
    let billing = service(repo.clone(), provider);

    let now = Utc::now().timestamp();
    let newer = subscription_event_payload(
        "evt_2",
        "customer.subscription.updated",
        "sub_1",
        "cus_1",
        "active",
        "price_m",
        now,
    );
    let older = subscription_event_payload(
        "evt_1",
        "customer.subscription.updated",
        "sub_1",
        "cus_1",
        "past_due",
        "price_m",
        now - 1_000,
    );

    assert_eq!(deliver(&billing, &newer).await, ReconcileOutcome::Applied);
    assert_eq!(
        deliver(&billing, &older).await,
        ReconcileOutcome::SkippedStale
    );

    let row = repo.get("user_1").await.unwrap().unwrap();
    assert_eq!(row.status, "active");
}

#[tokio::test]
async fn test_deletion_clears_plan_and_period() {
    let repo = Arc::new(MockSubscriptionRepository::new());
    let provider = Arc::new(MockPaymentProvider::new());
    provider.insert_customer("cus_1", Some("user_1"));
    let billing = service(repo.clone(), provider);

    let now = Utc::now().timestamp();
    let created = subscription_event_payload(
        "evt_1",
        "customer.subscription.created",
        "sub_1",
        "cus_1",
        "active",
        "price_m",
        now - 10,
    );
    let deleted = subscription_event_payload(
        "evt_2",
        "customer.subscription.deleted",
        "sub_1",
        "cus_1",
        "canceled",
        "price_m",
        now,
    );

    assert_eq!(deliver(&billing, &created).await, ReconcileOutcome::Applied);
    assert_eq!(deliver(&billing, &deleted).await, ReconcileOutcome::Applied);

    let row = repo.get("user_1").await.unwrap().unwrap();
    assert_eq!(row.status, "canceled");
    assert_eq!(row.plan, None);
    assert_eq!(row.current_period_end, None);
    assert_eq!(row.stripe_subscription_id.as_deref(), Some("sub_1"));
}

#[tokio::test]
async fn test_stale_update_cannot_resurrect_cancellation() {
    let repo = Arc::new(MockSubscriptionRepository::new());
    let provider = Arc::new(MockPaymentProvider::new());
    provider.insert_customer("cus_1", Some("user_1"));
    let billing = service(repo.clone(), provider);

    let now = Utc::now().timestamp();
    let deleted = subscription_event_payload(
        "evt_2",
        "customer.subscription.deleted",
        "sub_1",
        "cus_1",
        "canceled",
        "price_m",
        now,
    );
    // An update that the processor emitted before the deletion but
    // delivered after it.
    let late_update = subscription_event_payload(
        "evt_1",
        "customer.subscription.updated",
        "sub_1",
        "cus_1",
        "active",
        "price_m",
        now - 60,
    );

    assert_eq!(deliver(&billing, &deleted).await, ReconcileOutcome::Applied);
    assert_eq!(
        deliver(&billing, &late_update).await,
        ReconcileOutcome::SkippedStale
    );

    let row = repo.get("user_1").await.unwrap().unwrap();
    assert_eq!(row.status, "canceled");
    assert_eq!(row.plan, None);
}

#[tokio::test]
async fn test_unlinked_customer_is_acknowledged() {
    let repo = Arc::new(MockSubscriptionRepository::new());
    let provider = Arc::new(MockPaymentProvider::new());
    provider.insert_customer("cus_1", None);
    let billing = service(repo.clone(), provider);

    let payload = subscription_event_payload(
        "evt_1",
        "customer.subscription.updated",
        "sub_1",
        "cus_1",
        "active",
        "price_m",
        Utc::now().timestamp(),
    );

    assert_eq!(deliver(&billing, &payload).await, ReconcileOutcome::Ignored);
    assert!(repo.get("user_1").await.unwrap().is_none());
}

#[tokio::test]
async fn test_unknown_event_is_acknowledged() {
    let repo = Arc::new(MockSubscriptionRepository::new());
    let provider = Arc::new(MockPaymentProvider::new());
    let billing = service(repo.clone(), provider);

    let payload = serde_json::json!({
        "id": "evt_1",
        "type": "invoice.paid",
        "created": Utc::now().timestamp(),
        "data": {"object": {"id": "in_1"}}
    })
    .to_string();

    assert_eq!(deliver(&billing, &payload).await, ReconcileOutcome::Ignored);
}

#[tokio::test]
async fn test_unsigned_delivery_is_rejected() {
    let repo = Arc::new(MockSubscriptionRepository::new());
    let provider = Arc::new(MockPaymentProvider::new());
    provider.insert_customer("cus_1", Some("user_1"));
    let billing = service(repo.clone(), provider);

    let payload = subscription_event_payload(
        "evt_1",
        "customer.subscription.updated",
        "sub_1",
        "cus_1",
        "active",
        "price_m",
        Utc::now().timestamp(),
    );

    let result = billing
        .process_webhook(payload.as_bytes(), "t=0,v1=deadbeef")
        .await;

    assert!(result.is_err());
    assert!(repo.get("user_1").await.unwrap().is_none());
}

#[tokio::test]
async fn test_checkout_completed_links_user_via_session_metadata() {
    let repo = Arc::new(MockSubscriptionRepository::new());
    let provider = Arc::new(MockPaymentProvider::new());
    provider.insert_subscription(
        "sub_1",
        "cus_1",
        "active",
        "price_a",
        Utc::now().timestamp() + 86_400,
    );
    let billing = service(repo.clone(), provider);

    let payload = checkout_completed_payload(
        "evt_1",
        "cus_1",
        Some("sub_1"),
        Some("user_42"),
        Utc::now().timestamp(),
    );

    assert_eq!(deliver(&billing, &payload).await, ReconcileOutcome::Applied);
    let row = repo.get("user_42").await.unwrap().unwrap();
    assert_eq!(row.status, "active");
    assert_eq!(row.plan.as_deref(), Some("pro_annual"));
    assert_eq!(row.stripe_customer_id.as_deref(), Some("cus_1"));
}

#[tokio::test]
async fn test_checkout_without_user_metadata_is_acknowledged() {
    let repo = Arc::new(MockSubscriptionRepository::new());
    let provider = Arc::new(MockPaymentProvider::new());
    let billing = service(repo.clone(), provider);

    let payload = checkout_completed_payload(
        "evt_1",
        "cus_1",
        Some("sub_1"),
        None,
        Utc::now().timestamp(),
    );

    assert_eq!(deliver(&billing, &payload).await, ReconcileOutcome::Ignored);
}

#[tokio::test]
async fn test_unknown_price_leaves_plan_empty() {
    let repo = Arc::new(MockSubscriptionRepository::new());
    let provider = Arc::new(MockPaymentProvider::new());
    provider.insert_customer("cus_1", Some("user_1"));
    let billing = service(repo.clone(), provider);

    let payload = subscription_event_payload(
        "evt_1",
        "customer.subscription.updated",
        "sub_1",
        "cus_1",
        "active",
        "price_from_another_app",
        Utc::now().timestamp(),
    );

    assert_eq!(deliver(&billing, &payload).await, ReconcileOutcome::Applied);
    let row = repo.get("user_1").await.unwrap().unwrap();
    assert_eq!(row.status, "active");
    assert_eq!(row.plan, None);
}

#[tokio::test]
async fn test_unrecognized_status_is_stored_least_privileged() {
    let repo = Arc::new(MockSubscriptionRepository::new());
    let provider = Arc::new(MockPaymentProvider::new());
    provider.insert_customer("cus_1", Some("user_1"));
    let billing = service(repo.clone(), provider);

    let payload = subscription_event_payload(
        "evt_1",
        "customer.subscription.updated",
        "sub_1",
        "cus_1",
        "paused",
        "price_m",
        Utc::now().timestamp(),
    );

    assert_eq!(deliver(&billing, &payload).await, ReconcileOutcome::Applied);
    let row = repo.get("user_1").await.unwrap().unwrap();
    assert_eq!(row.status, "incomplete");
}

#[tokio::test]
async fn test_checkout_creates_customer_once() {
    let repo = Arc::new(MockSubscriptionRepository::new());
    let provider = Arc::new(MockPaymentProvider::new());
    let billing = service(repo.clone(), provider.clone());
    let user = UserId::new("user_1");

    let first = billing.create_checkout(&user, "price_m").await.unwrap();
    assert!(!first.url.is_empty());

    // The first initiation stores the customer on an incomplete record.
    let row = repo.get("user_1").await.unwrap().unwrap();
    assert_eq!(row.status, "incomplete");
    assert!(row.stripe_customer_id.is_some());

    billing.create_checkout(&user, "price_m").await.unwrap();
    assert_eq!(provider.created_customer_count(), 1);
}

#[tokio::test]
async fn test_portal_without_customer_is_not_found() {
    let repo = Arc::new(MockSubscriptionRepository::new());
    let provider = Arc::new(MockPaymentProvider::new());
    let billing = service(repo, provider);

    let err = billing
        .create_portal(&UserId::new("user_1"))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_entitlement_lookup_round_trips() {
    let repo = Arc::new(MockSubscriptionRepository::new());
    let provider = Arc::new(MockPaymentProvider::new());
    provider.insert_customer("cus_1", Some("user_1"));
    let billing = service(repo, provider);

    let payload = subscription_event_payload(
        "evt_1",
        "customer.subscription.updated",
        "sub_1",
        "cus_1",
        "active",
        "price_m",
        Utc::now().timestamp(),
    );
    deliver(&billing, &payload).await;

    let entitlement = billing
        .get_entitlement(&UserId::new("user_1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(entitlement.plan, Some(Plan::ProMonthly));
    assert!(entitlement.current_period_end.is_some());
}

//! Mock repository and payment provider for testing

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use spindex_billing_core::stripe::{
    StripeCustomer, StripeList, StripePrice, StripeSubscription, StripeSubscriptionItem,
};
use spindex_billing_core::{BillingError, CheckoutSession, PaymentProvider};
use spindex_db::{DbResult, SubscriptionRepository, SubscriptionRow, SubscriptionUpsert};
use spindex_types::UserId;

/// In-memory subscription repository mirroring the conditional upsert
#[derive(Default, Clone)]
pub struct MockSubscriptionRepository {
    rows: Arc<DashMap<String, SubscriptionRow>>,
}

impl MockSubscriptionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SubscriptionRepository for MockSubscriptionRepository {
    async fn get(&self, user_id: &str) -> DbResult<Option<SubscriptionRow>> {
        Ok(self.rows.get(user_id).map(|r| r.value().clone()))
    }

    async fn upsert(&self, sub: SubscriptionUpsert) -> DbResult<Option<SubscriptionRow>> {
        // Same guard as the SQL implementation: a stored event timestamp
        // only yields to an equal or newer incoming one.
        let existing = self.rows.get(&sub.user_id).map(|r| r.value().clone());
        if let Some(ref row) = existing {
            if let Some(stored) = row.last_event_at {
                match sub.last_event_at {
                    Some(incoming) if incoming >= stored => {}
                    _ => return Ok(None),
                }
            }
        }

        let now = Utc::now();
        let row = SubscriptionRow {
            user_id: sub.user_id.clone(),
            stripe_customer_id: sub.stripe_customer_id,
            stripe_subscription_id: sub.stripe_subscription_id,
            status: sub.status.as_str().to_string(),
            plan: sub.plan.map(|p| p.as_str().to_string()),
            current_period_end: sub.current_period_end,
            last_event_at: sub.last_event_at,
            created_at: existing.map(|r| r.created_at).unwrap_or(now),
            updated_at: now,
        };
        self.rows.insert(sub.user_id, row.clone());
        Ok(Some(row))
    }
}

/// In-memory payment provider
#[derive(Default)]
pub struct MockPaymentProvider {
    customers: DashMap<String, StripeCustomer>,
    subscriptions: DashMap<String, StripeSubscription>,
    created_customers: AtomicUsize,
}

impl MockPaymentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a customer, optionally linked to a user
    pub fn insert_customer(&self, id: &str, user_id: Option<&str>) {
        let mut metadata = HashMap::new();
        if let Some(uid) = user_id {
            metadata.insert("user_id".to_string(), uid.to_string());
        }
        self.customers.insert(
            id.to_string(),
            StripeCustomer {
                id: id.to_string(),
                email: None,
                metadata,
                deleted: false,
            },
        );
    }

    /// Register a subscription
    pub fn insert_subscription(
        &self,
        id: &str,
        customer_id: &str,
        status: &str,
        price_id: &str,
        current_period_end: i64,
    ) {
        self.subscriptions.insert(
            id.to_string(),
            StripeSubscription {
                id: id.to_string(),
                customer: customer_id.to_string(),
                status: status.to_string(),
                current_period_end,
                cancel_at_period_end: false,
                items: StripeList {
                    data: vec![StripeSubscriptionItem {
                        id: format!("si_{id}"),
                        price: StripePrice {
                            id: price_id.to_string(),
                        },
                    }],
                    has_more: false,
                },
            },
        );
    }

    /// How many customers were created through the provider
    pub fn created_customer_count(&self) -> usize {
        self.created_customers.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentProvider for MockPaymentProvider {
    async fn create_customer(&self, user_id: &UserId) -> Result<StripeCustomer, BillingError> {
        let n = self.created_customers.fetch_add(1, Ordering::SeqCst);
        let id = format!("cus_mock_{n}");
        self.insert_customer(&id, Some(user_id.as_str()));
        Ok(self.customers.get(&id).unwrap().clone())
    }

    async fn get_customer(&self, customer_id: &str) -> Result<StripeCustomer, BillingError> {
        self.customers
            .get(customer_id)
            .map(|r| r.value().clone())
            .ok_or_else(|| BillingError::ProviderError("no such customer".to_string()))
    }

    async fn get_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<StripeSubscription, BillingError> {
        self.subscriptions
            .get(subscription_id)
            .map(|r| r.value().clone())
            .ok_or_else(|| BillingError::ProviderError("no such subscription".to_string()))
    }

    async fn create_checkout_session(
        &self,
        customer_id: &str,
        price_id: &str,
        _user_id: &UserId,
        _success_url: &str,
        _cancel_url: &str,
    ) -> Result<CheckoutSession, BillingError> {
        Ok(CheckoutSession {
            session_id: format!("cs_mock_{customer_id}"),
            url: format!("https://checkout.stripe.test/{price_id}"),
        })
    }

    async fn create_portal_session(
        &self,
        customer_id: &str,
        _return_url: &str,
    ) -> Result<String, BillingError> {
        Ok(format!("https://billing.stripe.test/{customer_id}"))
    }
}

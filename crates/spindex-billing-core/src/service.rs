//! Billing service
//!
//! Facade over webhook processing, checkout, and portal sessions. The
//! HTTP layer talks to this type only.

use std::sync::Arc;

use tracing::{debug, instrument};

use spindex_db::{SubscriptionRepository, SubscriptionUpsert};
use spindex_types::{Entitlement, SubscriptionStatus, UserId};

use crate::config::BillingConfig;
use crate::error::BillingError;
use crate::provider::{CheckoutSession, PaymentProvider};
use crate::reconciler::{ReconcileOutcome, Reconciler};
use crate::webhook::WebhookHandler;

/// Billing service
pub struct BillingService<S, P> {
    subscriptions: Arc<S>,
    provider: Arc<P>,
    webhook: WebhookHandler,
    reconciler: Reconciler<S, P>,
    config: BillingConfig,
}

impl<S: SubscriptionRepository, P: PaymentProvider> BillingService<S, P> {
    /// Create a new billing service
    pub fn new(subscriptions: Arc<S>, provider: Arc<P>, config: BillingConfig) -> Self {
        let webhook = WebhookHandler::new(&config.stripe_webhook_secret);
        let reconciler = Reconciler::new(subscriptions.clone(), provider.clone(), config.clone());
        Self {
            subscriptions,
            provider,
            webhook,
            reconciler,
            config,
        }
    }

    /// Verify a webhook delivery and apply it to the entitlement store
    pub async fn process_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<ReconcileOutcome, BillingError> {
        let event = self.webhook.verify_and_parse(payload, signature)?;
        self.reconciler.apply(&event).await
    }

    /// Create a checkout session for a subscription price
    ///
    /// Reuses the user's payment customer when one is on record;
    /// otherwise creates one and stores its id on an `incomplete`
    /// entitlement record so later events can find it.
    #[instrument(skip(self))]
    pub async fn create_checkout(
        &self,
        user_id: &UserId,
        price_id: &str,
    ) -> Result<CheckoutSession, BillingError> {
        let existing = self.subscriptions.get(user_id.as_str()).await?;

        let customer_id = match existing.as_ref().and_then(|r| r.stripe_customer_id.clone()) {
            Some(id) => id,
            None => {
                let customer = self.provider.create_customer(user_id).await?;

                // Carry any stored fields through unchanged; only the
                // customer id is new here.
                let upsert = match &existing {
                    Some(row) => {
                        let e = row.to_entitlement();
                        SubscriptionUpsert {
                            user_id: row.user_id.clone(),
                            stripe_customer_id: Some(customer.id.clone()),
                            stripe_subscription_id: e.stripe_subscription_id,
                            status: e.status,
                            plan: e.plan,
                            current_period_end: e.current_period_end,
                            last_event_at: e.last_event_at,
                        }
                    }
                    None => SubscriptionUpsert {
                        user_id: user_id.to_string(),
                        stripe_customer_id: Some(customer.id.clone()),
                        stripe_subscription_id: None,
                        status: SubscriptionStatus::Incomplete,
                        plan: None,
                        current_period_end: None,
                        last_event_at: None,
                    },
                };

                if self.subscriptions.upsert(upsert).await?.is_none() {
                    // Lost a race with a webhook event; that event's
                    // snapshot already carries its own customer id.
                    debug!(user_id = %user_id, "Customer id write raced a newer event");
                }

                customer.id
            }
        };

        self.provider
            .create_checkout_session(
                &customer_id,
                price_id,
                user_id,
                &self.config.checkout_success_url(),
                &self.config.checkout_cancel_url(),
            )
            .await
    }

    /// Create a customer portal session for the user's stored customer
    #[instrument(skip(self))]
    pub async fn create_portal(&self, user_id: &UserId) -> Result<String, BillingError> {
        let customer_id = self
            .subscriptions
            .get(user_id.as_str())
            .await?
            .and_then(|r| r.stripe_customer_id)
            .ok_or(BillingError::CustomerNotFound)?;

        self.provider
            .create_portal_session(&customer_id, &self.config.portal_return_url())
            .await
    }

    /// Fetch the user's entitlement record
    pub async fn get_entitlement(
        &self,
        user_id: &UserId,
    ) -> Result<Option<Entitlement>, BillingError> {
        let record = self.subscriptions.get(user_id.as_str()).await?;
        Ok(record.map(|r| r.to_entitlement()))
    }
}

impl<S, P> std::fmt::Debug for BillingService<S, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BillingService").finish_non_exhaustive()
    }
}

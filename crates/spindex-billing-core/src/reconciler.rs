//! Entitlement reconciliation
//!
//! Applies verified processor lifecycle events to the entitlement
//! store. Every write is a full snapshot replacement, so redelivery of
//! an event is harmless, and the store's event-timestamp guard turns
//! out-of-order deliveries into logged no-ops.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use tracing::{debug, info, instrument, warn};

use spindex_db::{SubscriptionRepository, SubscriptionUpsert};
use spindex_types::SubscriptionStatus;

use crate::config::BillingConfig;
use crate::error::BillingError;
use crate::provider::PaymentProvider;
use crate::webhook::{CheckoutSessionData, SubscriptionEventData, WebhookEvent, WebhookEventData, WebhookEventType};

/// What the reconciler did with an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Entitlement store updated
    Applied,
    /// A newer event had already been applied; nothing changed
    SkippedStale,
    /// Event carried nothing actionable (unknown kind, no user link)
    Ignored,
}

impl ReconcileOutcome {
    /// String form for logs and metric labels
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::SkippedStale => "skipped_stale",
            Self::Ignored => "ignored",
        }
    }
}

/// Applies processor lifecycle events to the entitlement store
pub struct Reconciler<S, P> {
    subscriptions: Arc<S>,
    provider: Arc<P>,
    config: BillingConfig,
}

impl<S: SubscriptionRepository, P: PaymentProvider> Reconciler<S, P> {
    /// Create a new reconciler
    pub fn new(subscriptions: Arc<S>, provider: Arc<P>, config: BillingConfig) -> Self {
        Self {
            subscriptions,
            provider,
            config,
        }
    }

    /// Apply a verified webhook event
    #[instrument(skip(self, event), fields(event_id = %event.id))]
    pub async fn apply(&self, event: &WebhookEvent) -> Result<ReconcileOutcome, BillingError> {
        match &event.data {
            WebhookEventData::CheckoutSession(data) => {
                self.apply_checkout_completed(event, data).await
            }
            WebhookEventData::Subscription(data) => {
                if event.event_type == WebhookEventType::CustomerSubscriptionDeleted {
                    self.apply_subscription_deleted(event, data).await
                } else {
                    self.apply_subscription_change(event, data).await
                }
            }
            WebhookEventData::Raw(_) => {
                info!("Ignoring unhandled webhook event");
                Ok(ReconcileOutcome::Ignored)
            }
        }
    }

    /// Checkout completed: the session metadata names the user, the
    /// subscription it created carries the authoritative state.
    async fn apply_checkout_completed(
        &self,
        event: &WebhookEvent,
        data: &CheckoutSessionData,
    ) -> Result<ReconcileOutcome, BillingError> {
        let Some(user_id) = data.user_id.as_deref() else {
            warn!(session_id = %data.session_id, "Checkout completed without user reference, acknowledging");
            return Ok(ReconcileOutcome::Ignored);
        };
        let Some(subscription_id) = data.subscription_id.as_deref() else {
            debug!(session_id = %data.session_id, "Checkout completed without subscription");
            return Ok(ReconcileOutcome::Ignored);
        };

        let subscription = self.provider.get_subscription(subscription_id).await?;
        let plan = subscription
            .price_id()
            .and_then(|p| self.config.plan_for_price(p));
        let current_period_end = Utc
            .timestamp_opt(subscription.current_period_end, 0)
            .single()
            .ok_or_else(|| {
                BillingError::ProviderError("invalid period end timestamp".to_string())
            })?;
        let customer_id = data
            .customer_id
            .clone()
            .unwrap_or_else(|| subscription.customer.clone());

        self.upsert(
            event,
            SubscriptionUpsert {
                user_id: user_id.to_string(),
                stripe_customer_id: Some(customer_id),
                stripe_subscription_id: Some(subscription.id.clone()),
                status: parse_status(&subscription.status),
                plan,
                current_period_end: Some(current_period_end),
                last_event_at: Some(event_timestamp(event)?),
            },
        )
        .await
    }

    /// Subscription created or updated: the customer record's metadata
    /// names the user.
    async fn apply_subscription_change(
        &self,
        event: &WebhookEvent,
        data: &SubscriptionEventData,
    ) -> Result<ReconcileOutcome, BillingError> {
        let customer = self.provider.get_customer(&data.customer_id).await?;
        let Some(user_id) = customer.user_id() else {
            warn!(customer_id = %data.customer_id, "Subscription event for unlinked customer, acknowledging");
            return Ok(ReconcileOutcome::Ignored);
        };

        let plan = data
            .price_id
            .as_deref()
            .and_then(|p| self.config.plan_for_price(p));

        self.upsert(
            event,
            SubscriptionUpsert {
                user_id: user_id.to_string(),
                stripe_customer_id: Some(data.customer_id.clone()),
                stripe_subscription_id: Some(data.subscription_id.clone()),
                status: parse_status(&data.status),
                plan,
                current_period_end: Some(data.current_period_end),
                last_event_at: Some(event_timestamp(event)?),
            },
        )
        .await
    }

    /// Subscription deleted: the record flips to canceled with no plan
    /// and no period end.
    async fn apply_subscription_deleted(
        &self,
        event: &WebhookEvent,
        data: &SubscriptionEventData,
    ) -> Result<ReconcileOutcome, BillingError> {
        let customer = self.provider.get_customer(&data.customer_id).await?;
        let Some(user_id) = customer.user_id() else {
            warn!(customer_id = %data.customer_id, "Subscription deletion for unlinked customer, acknowledging");
            return Ok(ReconcileOutcome::Ignored);
        };

        self.upsert(
            event,
            SubscriptionUpsert {
                user_id: user_id.to_string(),
                stripe_customer_id: Some(data.customer_id.clone()),
                stripe_subscription_id: Some(data.subscription_id.clone()),
                status: SubscriptionStatus::Canceled,
                plan: None,
                current_period_end: None,
                last_event_at: Some(event_timestamp(event)?),
            },
        )
        .await
    }

    async fn upsert(
        &self,
        event: &WebhookEvent,
        upsert: SubscriptionUpsert,
    ) -> Result<ReconcileOutcome, BillingError> {
        match self.subscriptions.upsert(upsert).await? {
            Some(row) => {
                info!(user_id = %row.user_id, status = %row.status, "Entitlement updated");
                Ok(ReconcileOutcome::Applied)
            }
            None => {
                info!(event_created = event.created, "Stale event skipped, newer state already applied");
                Ok(ReconcileOutcome::SkippedStale)
            }
        }
    }
}

/// Parse a processor-reported status, treating anything unrecognized as
/// the least-privileged state.
fn parse_status(raw: &str) -> SubscriptionStatus {
    raw.parse().unwrap_or_else(|_| {
        warn!(status = %raw, "Unrecognized subscription status");
        SubscriptionStatus::Incomplete
    })
}

fn event_timestamp(event: &WebhookEvent) -> Result<DateTime<Utc>, BillingError> {
    event
        .created_at()
        .ok_or_else(|| BillingError::WebhookError("invalid event timestamp".to_string()))
}

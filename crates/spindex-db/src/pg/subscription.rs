//! PostgreSQL subscription repository implementation

use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::DbResult;
use crate::models::SubscriptionRow;
use crate::repo::{SubscriptionRepository, SubscriptionUpsert};

/// PostgreSQL subscription repository
#[derive(Clone)]
pub struct PgSubscriptionRepository {
    pool: PgPool,
}

impl PgSubscriptionRepository {
    /// Create a new subscription repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriptionRepository for PgSubscriptionRepository {
    async fn get(&self, user_id: &str) -> DbResult<Option<SubscriptionRow>> {
        let sub = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            SELECT user_id, stripe_customer_id, stripe_subscription_id, status, plan,
                   current_period_end, last_event_at, created_at, updated_at
            FROM subscriptions
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sub)
    }

    async fn upsert(&self, sub: SubscriptionUpsert) -> DbResult<Option<SubscriptionRow>> {
        // The conflict guard makes replays and out-of-order deliveries
        // safe: an update only lands when the stored record has no event
        // timestamp yet or the incoming one is at least as recent. A
        // skipped update returns no row.
        let row = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            INSERT INTO subscriptions (user_id, stripe_customer_id, stripe_subscription_id,
                                       status, plan, current_period_end, last_event_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (user_id) DO UPDATE
            SET stripe_customer_id = excluded.stripe_customer_id,
                stripe_subscription_id = excluded.stripe_subscription_id,
                status = excluded.status,
                plan = excluded.plan,
                current_period_end = excluded.current_period_end,
                last_event_at = excluded.last_event_at,
                updated_at = NOW()
            WHERE subscriptions.last_event_at IS NULL
               OR subscriptions.last_event_at <= excluded.last_event_at
            RETURNING user_id, stripe_customer_id, stripe_subscription_id, status, plan,
                      current_period_end, last_event_at, created_at, updated_at
            "#,
        )
        .bind(&sub.user_id)
        .bind(&sub.stripe_customer_id)
        .bind(&sub.stripe_subscription_id)
        .bind(sub.status.as_str())
        .bind(sub.plan.map(|p| p.as_str()))
        .bind(sub.current_period_end)
        .bind(sub.last_event_at)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }
}

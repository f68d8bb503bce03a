//! Database row models
//!
//! These types map directly to database rows using SQLx's FromRow derive.

use chrono::{DateTime, Utc};
use spindex_types::{Entitlement, SubscriptionStatus, UserId};
use sqlx::FromRow;
use uuid::Uuid;

/// Subscription row from the database
///
/// `status` and `plan` are stored as text; rows written by the reconciler
/// only ever hold recognized values, but conversion still falls back to
/// the least-privileged reading for anything unrecognized.
#[derive(Debug, Clone, FromRow)]
pub struct SubscriptionRow {
    pub user_id: String,
    pub stripe_customer_id: Option<String>,
    pub stripe_subscription_id: Option<String>,
    pub status: String,
    pub plan: Option<String>,
    pub current_period_end: Option<DateTime<Utc>>,
    pub last_event_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SubscriptionRow {
    /// Convert to the domain entitlement snapshot
    pub fn to_entitlement(&self) -> Entitlement {
        Entitlement {
            user_id: UserId::new(&self.user_id),
            stripe_customer_id: self.stripe_customer_id.clone(),
            stripe_subscription_id: self.stripe_subscription_id.clone(),
            status: self
                .status
                .parse()
                .unwrap_or(SubscriptionStatus::Incomplete),
            plan: self.plan.as_deref().and_then(|p| p.parse().ok()),
            current_period_end: self.current_period_end,
            last_event_at: self.last_event_at,
        }
    }
}

/// University row from the database
#[derive(Debug, Clone, FromRow)]
pub struct UniversityRow {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Company row from the database
#[derive(Debug, Clone, FromRow)]
pub struct CompanyRow {
    pub id: Uuid,
    pub university_id: Uuid,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub website: Option<String>,
    pub linkedin_url: Option<String>,
    pub tags: Vec<String>,
    pub segment: Option<String>,
    pub new_this_week: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Person row from the database
#[derive(Debug, Clone, FromRow)]
pub struct PersonRow {
    pub id: Uuid,
    pub university_id: Uuid,
    pub company_id: Option<Uuid>,
    pub slug: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub linkedin_url: Option<String>,
    pub profile_url: Option<String>,
    pub other_urls: Vec<String>,
    pub tags: Vec<String>,
    pub segment: Option<String>,
    pub new_this_week: bool,
    pub last_contacted_at: Option<DateTime<Utc>>,
    pub next_touch_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PersonRow {
    /// Full display name
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Outreach template row from the database
#[derive(Debug, Clone, FromRow)]
pub struct TemplateRow {
    pub id: Uuid,
    pub university_id: Uuid,
    pub name: String,
    pub subject: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

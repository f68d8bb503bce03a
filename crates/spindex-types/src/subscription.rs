//! Subscription status and the entitlement record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Plan, UserId};

/// Subscription status as mirrored from the payment processor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Subscription is active
    Active,
    /// Subscription was canceled
    Canceled,
    /// Payment is past due
    PastDue,
    /// In trial period
    Trialing,
    /// Checkout started but not completed
    Incomplete,
    /// Checkout abandoned past the processor's grace window
    IncompleteExpired,
}

impl SubscriptionStatus {
    /// Stable string form, matching what the store persists
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Canceled => "canceled",
            Self::PastDue => "past_due",
            Self::Trialing => "trialing",
            Self::Incomplete => "incomplete",
            Self::IncompleteExpired => "incomplete_expired",
        }
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SubscriptionStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "canceled" => Ok(Self::Canceled),
            "past_due" => Ok(Self::PastDue),
            "trialing" => Ok(Self::Trialing),
            "incomplete" => Ok(Self::Incomplete),
            "incomplete_expired" => Ok(Self::IncompleteExpired),
            _ => Err(StatusParseError(s.to_string())),
        }
    }
}

/// Error parsing a subscription status string
#[derive(Debug, Clone)]
pub struct StatusParseError(pub String);

impl std::fmt::Display for StatusParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid subscription status: {}", self.0)
    }
}

impl std::error::Error for StatusParseError {}

/// Local entitlement record, mirrored from the payment processor.
///
/// One record per user. Cancellation is a status transition; records
/// are never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entitlement {
    /// Owner of the record
    pub user_id: UserId,
    /// Processor customer reference, set at first checkout initiation
    pub stripe_customer_id: Option<String>,
    /// Processor subscription reference
    pub stripe_subscription_id: Option<String>,
    /// Mirrored subscription status
    pub status: SubscriptionStatus,
    /// Paid plan, or None for records without a priced subscription
    pub plan: Option<Plan>,
    /// End of the current billing period
    pub current_period_end: Option<DateTime<Utc>>,
    /// Processor event time of the last applied lifecycle event.
    /// None for records created locally (checkout initiation).
    pub last_event_at: Option<DateTime<Utc>>,
}

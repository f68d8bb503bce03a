//! Billing errors

use thiserror::Error;

/// Billing errors
#[derive(Error, Debug)]
pub enum BillingError {
    /// No payment customer on record for the user
    #[error("customer not found")]
    CustomerNotFound,

    /// Payment provider error
    #[error("provider error: {0}")]
    ProviderError(String),

    /// Webhook verification or parsing error
    #[error("webhook error: {0}")]
    WebhookError(String),

    /// Database error
    #[error("database error: {0}")]
    Database(#[from] spindex_db::DbError),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl BillingError {
    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::CustomerNotFound)
    }

    /// Check if this error means the webhook delivery itself was bad
    pub fn is_webhook_rejection(&self) -> bool {
        matches!(self, Self::WebhookError(_))
    }
}

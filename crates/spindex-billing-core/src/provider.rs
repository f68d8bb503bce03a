//! Payment provider abstraction

use async_trait::async_trait;

use spindex_types::UserId;

use crate::error::BillingError;
use crate::stripe::{StripeCustomer, StripeSubscription};

/// Checkout session handed back to the caller
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    /// Session ID
    pub session_id: String,
    /// Hosted checkout URL
    pub url: String,
}

/// Payment provider trait
///
/// Abstracts payment processing to allow different providers (Stripe, etc.)
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Create a customer tagged with the user's identity
    async fn create_customer(&self, user_id: &UserId) -> Result<StripeCustomer, BillingError>;

    /// Fetch a customer
    async fn get_customer(&self, customer_id: &str) -> Result<StripeCustomer, BillingError>;

    /// Fetch a subscription
    async fn get_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<StripeSubscription, BillingError>;

    /// Create a checkout session for a subscription price
    async fn create_checkout_session(
        &self,
        customer_id: &str,
        price_id: &str,
        user_id: &UserId,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<CheckoutSession, BillingError>;

    /// Create a customer portal session, returning its URL
    async fn create_portal_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> Result<String, BillingError>;
}

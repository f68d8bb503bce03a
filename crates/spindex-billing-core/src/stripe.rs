//! Stripe payment provider implementation

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use spindex_types::UserId;

use crate::config::BillingConfig;
use crate::error::BillingError;
use crate::provider::{CheckoutSession, PaymentProvider};

const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

/// Customer metadata key carrying our user id
pub const CUSTOMER_USER_ID_KEY: &str = "user_id";

/// Stripe payment provider
#[derive(Clone)]
pub struct StripeProvider {
    client: Client,
    config: BillingConfig,
}

impl StripeProvider {
    /// Create a new Stripe provider
    pub fn new(config: BillingConfig) -> Self {
        let client = Client::new();
        Self { client, config }
    }

    /// Make authenticated request to Stripe
    async fn stripe_request<T: for<'de> Deserialize<'de>>(
        &self,
        method: reqwest::Method,
        endpoint: &str,
        form: Option<&[(&str, &str)]>,
    ) -> Result<T, BillingError> {
        let url = format!("{STRIPE_API_BASE}{endpoint}");

        let mut request = self
            .client
            .request(method, &url)
            .basic_auth(&self.config.stripe_secret_key, Option::<&str>::None);

        if let Some(form_data) = form {
            request = request.form(form_data);
        }

        let response = request.send().await.map_err(|e| {
            error!(error = %e, "Stripe API request failed");
            BillingError::ProviderError(e.to_string())
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Stripe API error");
            return Err(BillingError::ProviderError(format!(
                "Stripe API error: {status}"
            )));
        }

        response.json::<T>().await.map_err(|e| {
            error!(error = %e, "Failed to parse Stripe response");
            BillingError::Internal(e.to_string())
        })
    }
}

#[async_trait]
impl PaymentProvider for StripeProvider {
    #[instrument(skip(self))]
    async fn create_customer(&self, user_id: &UserId) -> Result<StripeCustomer, BillingError> {
        debug!(user_id = %user_id, "Creating Stripe customer");

        let metadata_key = format!("metadata[{CUSTOMER_USER_ID_KEY}]");
        let form = [(metadata_key.as_str(), user_id.as_str())];

        self.stripe_request(reqwest::Method::POST, "/customers", Some(&form))
            .await
    }

    #[instrument(skip(self))]
    async fn get_customer(&self, customer_id: &str) -> Result<StripeCustomer, BillingError> {
        debug!(customer_id = %customer_id, "Getting Stripe customer");

        self.stripe_request::<StripeCustomer>(
            reqwest::Method::GET,
            &format!("/customers/{customer_id}"),
            None,
        )
        .await
    }

    #[instrument(skip(self))]
    async fn get_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<StripeSubscription, BillingError> {
        debug!(subscription_id = %subscription_id, "Getting Stripe subscription");

        self.stripe_request::<StripeSubscription>(
            reqwest::Method::GET,
            &format!("/subscriptions/{subscription_id}"),
            None,
        )
        .await
    }

    #[instrument(skip(self))]
    async fn create_checkout_session(
        &self,
        customer_id: &str,
        price_id: &str,
        user_id: &UserId,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<CheckoutSession, BillingError> {
        debug!(customer_id = %customer_id, price_id = %price_id, "Creating checkout session");

        let metadata_key = format!("metadata[{CUSTOMER_USER_ID_KEY}]");
        let form = [
            ("customer", customer_id),
            ("mode", "subscription"),
            ("success_url", success_url),
            ("cancel_url", cancel_url),
            ("line_items[0][price]", price_id),
            ("line_items[0][quantity]", "1"),
            ("payment_method_types[0]", "card"),
            (metadata_key.as_str(), user_id.as_str()),
        ];

        let session: StripeCheckoutSession = self
            .stripe_request(reqwest::Method::POST, "/checkout/sessions", Some(&form))
            .await?;

        Ok(CheckoutSession {
            session_id: session.id,
            url: session.url.unwrap_or_default(),
        })
    }

    #[instrument(skip(self))]
    async fn create_portal_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> Result<String, BillingError> {
        debug!(customer_id = %customer_id, "Creating portal session");

        let form = [("customer", customer_id), ("return_url", return_url)];

        let session: StripeBillingPortalSession = self
            .stripe_request(
                reqwest::Method::POST,
                "/billing_portal/sessions",
                Some(&form),
            )
            .await?;

        Ok(session.url)
    }
}

// Stripe API response types

/// Stripe customer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripeCustomer {
    /// Customer ID
    pub id: String,
    /// Customer email
    pub email: Option<String>,
    /// Customer metadata
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    /// Whether the customer is deleted
    #[serde(default)]
    pub deleted: bool,
}

impl StripeCustomer {
    /// Our user id carried in the customer metadata, if any
    pub fn user_id(&self) -> Option<&str> {
        self.metadata.get(CUSTOMER_USER_ID_KEY).map(String::as_str)
    }
}

/// Stripe subscription
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripeSubscription {
    /// Subscription ID
    pub id: String,
    /// Customer ID
    pub customer: String,
    /// Subscription status
    pub status: String,
    /// Current period end (Unix timestamp)
    pub current_period_end: i64,
    /// Whether subscription cancels at period end
    #[serde(default)]
    pub cancel_at_period_end: bool,
    /// Subscription items
    pub items: StripeList<StripeSubscriptionItem>,
}

impl StripeSubscription {
    /// Price ID of the first subscription item
    pub fn price_id(&self) -> Option<&str> {
        self.items.data.first().map(|item| item.price.id.as_str())
    }
}

/// Stripe subscription item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripeSubscriptionItem {
    /// Item ID
    pub id: String,
    /// Price attached to the item
    pub price: StripePrice,
}

/// Stripe price
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripePrice {
    /// Price ID
    pub id: String,
}

/// Stripe checkout session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripeCheckoutSession {
    /// Session ID
    pub id: String,
    /// Checkout URL
    pub url: Option<String>,
    /// Customer ID
    pub customer: Option<String>,
    /// Subscription ID (after completion)
    pub subscription: Option<String>,
    /// Session metadata
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// Stripe billing portal session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripeBillingPortalSession {
    /// Session ID
    pub id: String,
    /// Portal URL
    pub url: String,
}

/// Stripe list response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripeList<T> {
    /// List data
    pub data: Vec<T>,
    /// Whether there are more items
    #[serde(default)]
    pub has_more: bool,
}

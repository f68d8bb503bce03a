//! Billing configuration

use std::collections::HashMap;

use spindex_types::Plan;

/// Billing service configuration
#[derive(Debug, Clone)]
pub struct BillingConfig {
    /// Stripe secret key
    pub stripe_secret_key: String,
    /// Stripe webhook signing secret
    pub stripe_webhook_secret: String,
    /// Map of plans to Stripe price IDs
    pub price_ids: HashMap<Plan, String>,
    /// Public base URL of the application, without trailing slash
    pub app_url: String,
}

impl BillingConfig {
    /// Create a new billing config
    pub fn new(
        stripe_secret_key: impl Into<String>,
        stripe_webhook_secret: impl Into<String>,
        app_url: impl Into<String>,
    ) -> Self {
        Self {
            stripe_secret_key: stripe_secret_key.into(),
            stripe_webhook_secret: stripe_webhook_secret.into(),
            price_ids: HashMap::new(),
            app_url: app_url.into(),
        }
    }

    /// Set price ID for a plan
    pub fn with_price(mut self, plan: Plan, price_id: impl Into<String>) -> Self {
        self.price_ids.insert(plan, price_id.into());
        self
    }

    /// Get price ID for a plan
    pub fn get_price_id(&self, plan: Plan) -> Option<&str> {
        self.price_ids.get(&plan).map(String::as_str)
    }

    /// Map a Stripe price ID back to its plan
    ///
    /// Unknown price IDs map to no plan; the entitlement policy treats
    /// a plan-less subscription as unpaid.
    pub fn plan_for_price(&self, price_id: &str) -> Option<Plan> {
        self.price_ids
            .iter()
            .find(|(_, id)| id.as_str() == price_id)
            .map(|(plan, _)| *plan)
    }

    /// Where checkout lands after a completed payment
    pub fn checkout_success_url(&self) -> String {
        format!("{}/account?success=true", self.app_url)
    }

    /// Where checkout lands after the user backs out
    pub fn checkout_cancel_url(&self) -> String {
        format!("{}/pricing?canceled=true", self.app_url)
    }

    /// Where the customer portal returns to
    pub fn portal_return_url(&self) -> String {
        format!("{}/account", self.app_url)
    }
}

//! Application state

use std::sync::Arc;

use spindex_auth_core::SessionOracle;
use spindex_billing_core::{BillingService, StripeProvider};
use spindex_db::pg::PgSubscriptionRepository;
use spindex_db::{DbPool, Repositories};

use crate::config::Config;

/// Type alias for the billing service with concrete implementations
pub type BillingServiceImpl = BillingService<PgSubscriptionRepository, StripeProvider>;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Identity provider client for session resolution
    pub oracle: Arc<dyn SessionOracle>,
    /// Database repositories
    pub repos: Repositories,
    /// Billing service; `None` when the deployment runs without billing
    pub billing: Option<Arc<BillingServiceImpl>>,
    /// Database pool (readiness probe)
    pub pool: DbPool,
    /// Configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Create new application state
    pub fn new(
        oracle: impl SessionOracle + 'static,
        repos: Repositories,
        billing: Option<BillingServiceImpl>,
        pool: DbPool,
        config: Config,
    ) -> Self {
        Self {
            oracle: Arc::new(oracle),
            repos,
            billing: billing.map(Arc::new),
            pool,
            config: Arc::new(config),
        }
    }

    /// Get request timeout from config
    pub fn request_timeout(&self) -> std::time::Duration {
        self.config.request_timeout
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("billing_enabled", &self.billing.is_some())
            .finish_non_exhaustive()
    }
}

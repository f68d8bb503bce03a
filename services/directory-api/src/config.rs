//! Configuration for the Directory API service.

use std::time::Duration;

use spindex_auth_core::IdentityConfig;
use spindex_billing_core::BillingConfig;
use spindex_types::Plan;

/// Directory API configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub http_port: u16,
    /// Database URL
    pub database_url: String,
    /// Database pool size
    pub database_max_connections: u32,
    /// Identity provider configuration
    pub identity: IdentityConfig,
    /// Billing configuration; `None` when the deployment runs without billing
    pub billing: Option<BillingConfig>,
    /// Request timeout
    pub request_timeout: Duration,
    /// Metrics enabled
    pub metrics_enabled: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Database
        let database_url =
            std::env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;
        let database_max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("DATABASE_MAX_CONNECTIONS"))?;

        // Server port
        let http_port = std::env::var("HTTP_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("HTTP_PORT"))?;

        // Identity provider
        let identity = IdentityConfig {
            base_url: std::env::var("IDENTITY_BASE_URL")
                .map_err(|_| ConfigError::Missing("IDENTITY_BASE_URL"))?,
            api_key: std::env::var("IDENTITY_API_KEY")
                .map_err(|_| ConfigError::Missing("IDENTITY_API_KEY"))?,
        };

        // Billing is an optional block. Without a Stripe key the service
        // serves the directory and answers billing routes with 503; with
        // one, the rest of the block is required.
        let billing = match std::env::var("STRIPE_SECRET_KEY") {
            Ok(secret_key) => {
                let webhook_secret = std::env::var("STRIPE_WEBHOOK_SECRET")
                    .map_err(|_| ConfigError::Missing("STRIPE_WEBHOOK_SECRET"))?;
                let price_monthly = std::env::var("STRIPE_PRICE_PRO_MONTHLY")
                    .map_err(|_| ConfigError::Missing("STRIPE_PRICE_PRO_MONTHLY"))?;
                let price_annual = std::env::var("STRIPE_PRICE_PRO_ANNUAL")
                    .map_err(|_| ConfigError::Missing("STRIPE_PRICE_PRO_ANNUAL"))?;
                let app_url = std::env::var("APP_URL")
                    .unwrap_or_else(|_| "http://localhost:3000".to_string());

                Some(
                    BillingConfig::new(&secret_key, &webhook_secret, &app_url)
                        .with_price(Plan::ProMonthly, &price_monthly)
                        .with_price(Plan::ProAnnual, &price_annual),
                )
            }
            Err(_) => None,
        };

        // Request timeout
        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("REQUEST_TIMEOUT_SECS"))?;

        // Metrics
        let metrics_enabled = std::env::var("METRICS_ENABLED")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .unwrap_or(true);

        Ok(Self {
            http_port,
            database_url,
            database_max_connections,
            identity,
            billing,
            request_timeout: Duration::from_secs(request_timeout_secs),
            metrics_enabled,
        })
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}

//! Spindex Billing Core - Billing business logic
//!
//! Stripe integration, webhook verification, and reconciliation of
//! processor lifecycle events into the entitlement store.
//!
//! # Example
//!
//! ```rust,ignore
//! use spindex_billing_core::{BillingConfig, BillingService, StripeProvider};
//! use spindex_types::Plan;
//! use std::sync::Arc;
//!
//! let config = BillingConfig::new("sk_test_...", "whsec_...", "https://app.example.com")
//!     .with_price(Plan::ProMonthly, "price_monthly")
//!     .with_price(Plan::ProAnnual, "price_annual");
//!
//! let provider = Arc::new(StripeProvider::new(config.clone()));
//! let billing = BillingService::new(Arc::new(repos.subscriptions.clone()), provider, config);
//!
//! // Apply a signed webhook delivery
//! let outcome = billing.process_webhook(&payload, &signature).await?;
//! ```

pub mod config;
pub mod error;
pub mod provider;
pub mod reconciler;
pub mod service;
pub mod stripe;
pub mod webhook;

pub use config::BillingConfig;
pub use error::BillingError;
pub use provider::{CheckoutSession, PaymentProvider};
pub use reconciler::{ReconcileOutcome, Reconciler};
pub use service::BillingService;
pub use stripe::StripeProvider;
pub use webhook::{WebhookEvent, WebhookEventData, WebhookEventType, WebhookHandler};

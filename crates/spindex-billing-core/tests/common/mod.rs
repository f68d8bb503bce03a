//! Common test utilities for spindex-billing-core integration tests

pub mod events;
pub mod mocks;

#[allow(unused_imports)]
pub use events::{checkout_completed_payload, sign, subscription_event_payload, WEBHOOK_SECRET};
#[allow(unused_imports)]
pub use mocks::{MockPaymentProvider, MockSubscriptionRepository};

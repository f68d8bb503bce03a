//! Spindex Types - Shared domain types
//!
//! This crate contains domain types used across spindex crates:
//! - User identity and role claims
//! - Subscription plans, statuses, and the entitlement record
//! - The gated-field wrapper used for response redaction

pub mod gated;
pub mod plan;
pub mod subscription;
pub mod user;

pub use gated::*;
pub use plan::*;
pub use subscription::*;
pub use user::*;

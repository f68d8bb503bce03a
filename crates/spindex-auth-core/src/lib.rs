//! Spindex Auth Core - Access control business logic
//!
//! Session resolution against the external identity provider and the
//! pure access-policy decisions derived from role and entitlement.

pub mod error;
pub mod identity;
pub mod policy;

pub use error::*;
pub use identity::*;
pub use policy::*;

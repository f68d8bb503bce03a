//! REST API handlers

pub mod admin;
pub mod billing;
pub mod directory;
pub mod health;
pub mod shared;
pub mod webhook;
pub mod workflow;

pub use admin::*;
pub use billing::*;
pub use directory::*;
pub use health::*;
pub use webhook::*;
pub use workflow::*;

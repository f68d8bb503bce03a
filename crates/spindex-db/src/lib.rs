//! Spindex DB - Database abstractions
//!
//! SQLx-based database layer for the directory service.
//!
//! # Example
//!
//! ```rust,ignore
//! use spindex_db::{create_pool, Repositories};
//!
//! let pool = create_pool("postgres://localhost/spindex", 10).await?;
//! let repos = Repositories::new(pool);
//!
//! // Use repositories
//! let sub = repos.subscriptions.get("user_123").await?;
//! ```

pub mod error;
pub mod models;
pub mod pg;
pub mod pool;
pub mod repo;

pub use error::{DbError, DbResult};
pub use models::*;
pub use pg::Repositories;
pub use pool::{create_pool, DbPool};
pub use repo::*;

//! Database errors

use thiserror::Error;

/// Database errors
#[derive(Error, Debug)]
pub enum DbError {
    /// SQLx error
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

/// Convenience result alias for repository methods
pub type DbResult<T> = Result<T, DbError>;

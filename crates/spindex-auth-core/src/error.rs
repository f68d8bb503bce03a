//! Auth errors

use thiserror::Error;

/// Authentication errors
///
/// Bad or missing tokens are not errors; `SessionOracle` reports those
/// as a `None` resolution. These variants cover provider failures only.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Identity provider request failed (network, 5xx)
    #[error("identity provider error: {0}")]
    Provider(String),

    /// Identity provider returned a response we could not parse
    #[error("invalid identity provider response: {0}")]
    InvalidResponse(String),
}

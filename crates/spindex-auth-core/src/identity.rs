//! Identity provider client
//!
//! Sessions are issued and validated by an external identity provider.
//! This module resolves bearer session tokens to a user id and role
//! claim through the provider's verification endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use spindex_types::{Role, UserId};

use crate::error::AuthError;

/// Identity provider configuration
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    /// Base URL of the identity provider API
    pub base_url: String,
    /// Server-side API key for the verification endpoint
    pub api_key: String,
}

/// A session token resolved to its caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSession {
    /// Opaque user identifier owned by the identity provider
    pub user_id: UserId,
    /// Role claim carried in the provider's user metadata
    pub role: Role,
}

/// Session resolution
///
/// `Ok(None)` is the normal outcome for a token that does not resolve
/// (expired, revoked, malformed). Errors are reserved for provider
/// failures, never for bad tokens.
#[async_trait]
pub trait SessionOracle: Send + Sync {
    /// Resolve a bearer session token to its caller
    async fn resolve_session(&self, token: &str) -> Result<Option<ResolvedSession>, AuthError>;
}

/// HTTP client for the identity provider's verification endpoint
#[derive(Clone)]
pub struct HttpSessionOracle {
    client: Client,
    config: IdentityConfig,
}

impl HttpSessionOracle {
    /// Create a new identity provider client
    pub fn new(config: IdentityConfig) -> Self {
        let client = Client::new();
        Self { client, config }
    }
}

#[derive(Debug, Serialize)]
struct VerifyRequest<'a> {
    token: &'a str,
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    user_id: String,
    role: Option<String>,
}

#[async_trait]
impl SessionOracle for HttpSessionOracle {
    #[instrument(skip(self, token))]
    async fn resolve_session(&self, token: &str) -> Result<Option<ResolvedSession>, AuthError> {
        let url = format!("{}/v1/sessions/verify", self.config.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&VerifyRequest { token })
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "identity provider request failed");
                AuthError::Provider(e.to_string())
            })?;

        let status = response.status();

        // The provider answers 4xx for tokens it does not recognize;
        // that is a normal unauthenticated outcome, not a failure.
        if status.is_client_error() {
            debug!(status = %status, "session token did not resolve");
            return Ok(None);
        }

        if !status.is_success() {
            error!(status = %status, "identity provider error");
            return Err(AuthError::Provider(format!(
                "identity provider error: {status}"
            )));
        }

        let verify = response.json::<VerifyResponse>().await.map_err(|e| {
            error!(error = %e, "failed to parse identity provider response");
            AuthError::InvalidResponse(e.to_string())
        })?;

        Ok(Some(ResolvedSession {
            user_id: UserId::new(verify.user_id),
            role: Role::from_claim(verify.role.as_deref()),
        }))
    }
}

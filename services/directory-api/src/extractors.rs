//! Axum extractors for authentication
//!
//! Session tokens resolve through the identity provider, then the
//! caller's entitlement record is read once and folded into a
//! capability set. Handlers check capabilities, never raw records.

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use spindex_auth_core::{derive_capabilities, CapabilitySet, ResolvedSession};
use spindex_db::SubscriptionRepository;
use spindex_types::{Role, UserId};

use crate::state::AppState;

/// Authenticated caller extracted from the request
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: UserId,
    pub role: Role,
    pub capabilities: CapabilitySet,
}

/// Error response for auth failures
#[derive(Debug, Serialize)]
struct AuthErrorResponse {
    error: AuthErrorDetail,
}

#[derive(Debug, Serialize)]
struct AuthErrorDetail {
    code: &'static str,
    message: &'static str,
}

/// Auth rejection type
pub struct AuthRejection {
    status: StatusCode,
    code: &'static str,
    message: &'static str,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let body = AuthErrorResponse {
            error: AuthErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        // Try to extract token from Authorization header or cookie
        let token = extract_token(parts)?;

        let session = app_state
            .oracle
            .resolve_session(&token)
            .await
            .map_err(|e| {
                tracing::error!(error = ?e, "Session resolution failed");
                AuthRejection {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    code: "INTERNAL_ERROR",
                    message: "Authentication backend error",
                }
            })?;

        let Some(session) = session else {
            tracing::debug!("Session token did not resolve");
            return Err(AuthRejection {
                status: StatusCode::UNAUTHORIZED,
                code: "INVALID_TOKEN",
                message: "Invalid or expired token",
            });
        };

        build_auth_user(&app_state, session).await
    }
}

/// Look up the caller's entitlement and derive their capabilities
async fn build_auth_user(
    state: &AppState,
    session: ResolvedSession,
) -> Result<AuthUser, AuthRejection> {
    let entitlement = state
        .repos
        .subscriptions
        .get(session.user_id.as_str())
        .await
        .map_err(|e| {
            tracing::error!(error = ?e, "Entitlement lookup failed");
            AuthRejection {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                code: "INTERNAL_ERROR",
                message: "Entitlement lookup failed",
            }
        })?
        .map(|row| row.to_entitlement());

    let capabilities = derive_capabilities(session.role, entitlement.as_ref());

    Ok(AuthUser {
        user_id: session.user_id,
        role: session.role,
        capabilities,
    })
}

/// Extract token from Authorization header or session cookie
fn extract_token(parts: &Parts) -> Result<String, AuthRejection> {
    // Try Authorization header first (Bearer token)
    if let Some(auth_header) = parts.headers.get(header::AUTHORIZATION) {
        let auth_str = auth_header.to_str().map_err(|_| AuthRejection {
            status: StatusCode::BAD_REQUEST,
            code: "INVALID_HEADER",
            message: "Invalid Authorization header encoding",
        })?;

        if let Some(token) = auth_str.strip_prefix("Bearer ") {
            return Ok(token.to_string());
        }
    }

    // Try session cookie
    if let Some(cookie_header) = parts.headers.get(header::COOKIE) {
        let cookie_str = cookie_header.to_str().map_err(|_| AuthRejection {
            status: StatusCode::BAD_REQUEST,
            code: "INVALID_HEADER",
            message: "Invalid Cookie header encoding",
        })?;

        for cookie in cookie_str.split(';') {
            let cookie = cookie.trim();
            if let Some(value) = cookie.strip_prefix("spindex_session=") {
                return Ok(value.to_string());
            }
        }
    }

    Err(AuthRejection {
        status: StatusCode::UNAUTHORIZED,
        code: "MISSING_TOKEN",
        message: "No authentication token provided",
    })
}

/// Optional auth extractor for public routes
///
/// An absent or unresolvable token reads as an anonymous caller and the
/// response renders redacted; only backend failures reject.
#[derive(Debug, Clone)]
pub struct OptionalAuthUser(pub Option<AuthUser>);

impl<S> FromRequestParts<S> for OptionalAuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match AuthUser::from_request_parts(parts, state).await {
            Ok(user) => Ok(OptionalAuthUser(Some(user))),
            Err(r) if matches!(r.code, "MISSING_TOKEN" | "INVALID_TOKEN") => {
                Ok(OptionalAuthUser(None))
            }
            Err(r) => Err(r),
        }
    }
}

//! Error types for the Directory API service.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// API error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// API error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("University not found")]
    UniversityNotFound,

    #[error("Company not found")]
    CompanyNotFound,

    #[error("Person not found")]
    PersonNotFound,

    #[error("Template not found")]
    TemplateNotFound,

    #[error("Person has no email address")]
    EmailNotFound,

    #[error("Billing customer not found")]
    CustomerNotFound,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Billing is not configured")]
    BillingUnconfigured,

    #[error("Database error")]
    Database(#[from] spindex_db::DbError),

    #[error("Billing error")]
    Billing(#[from] spindex_billing_core::BillingError),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::UniversityNotFound
            | Self::CompanyNotFound
            | Self::PersonNotFound
            | Self::TemplateNotFound
            | Self::EmailNotFound
            | Self::CustomerNotFound => StatusCode::NOT_FOUND,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::BillingUnconfigured => StatusCode::SERVICE_UNAVAILABLE,
            Self::Billing(e) if e.is_webhook_rejection() => StatusCode::BAD_REQUEST,
            Self::Database(_) | Self::Billing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::UniversityNotFound => "UNIVERSITY_NOT_FOUND",
            Self::CompanyNotFound => "COMPANY_NOT_FOUND",
            Self::PersonNotFound => "PERSON_NOT_FOUND",
            Self::TemplateNotFound => "TEMPLATE_NOT_FOUND",
            Self::EmailNotFound => "EMAIL_NOT_FOUND",
            Self::CustomerNotFound => "CUSTOMER_NOT_FOUND",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::BillingUnconfigured => "BILLING_UNCONFIGURED",
            Self::Billing(e) if e.is_webhook_rejection() => "WEBHOOK_ERROR",
            Self::Database(_) | Self::Billing(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        // Log internal errors
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = ?self, "Internal API error");
        }

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
                details: None,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

//! Shared handler utilities
//!
//! Capability checks and payload validation used across handlers.
//! Centralizing these keeps denial responses and admin payload rules
//! consistent.

use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::{AppState, BillingServiceImpl};

// ============================================================================
// Capability Checks
// ============================================================================

/// Require the administer capability
pub fn require_admin(auth: &AuthUser) -> Result<(), ApiError> {
    if !auth.capabilities.administer {
        return Err(ApiError::Forbidden("Admin access required".to_string()));
    }
    Ok(())
}

/// Require the outreach capability
pub fn require_outreach(auth: &AuthUser) -> Result<(), ApiError> {
    if !auth.capabilities.run_outreach {
        return Err(ApiError::Forbidden(
            "Active subscription required".to_string(),
        ));
    }
    Ok(())
}

/// Require billing to be configured
pub fn require_billing(state: &AppState) -> Result<&BillingServiceImpl, ApiError> {
    state.billing.as_deref().ok_or(ApiError::BillingUnconfigured)
}

// ============================================================================
// Input Validation
// ============================================================================

/// Maximum length for a slug
pub const MAX_SLUG_LEN: usize = 64;

/// Maximum length for names, subjects, and URLs
pub const MAX_FIELD_LEN: usize = 256;

/// Maximum length for free-form text (descriptions, template bodies)
pub const MAX_TEXT_LEN: usize = 4000;

/// Maximum number of tags on a single entity
pub const MAX_TAGS: usize = 50;

/// Validate a slug for safe use in directory URLs.
///
/// Allows lowercase alphanumerics and hyphens, starting with an
/// alphanumeric. Slugs become path segments, so the charset is strict.
pub fn validate_slug(slug: &str) -> Result<(), ApiError> {
    if slug.is_empty() {
        return Err(ApiError::BadRequest("Slug cannot be empty".into()));
    }

    if slug.len() > MAX_SLUG_LEN {
        return Err(ApiError::BadRequest(format!(
            "Slug too long (max {MAX_SLUG_LEN} chars)"
        )));
    }

    if !slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(ApiError::BadRequest(
            "Slug contains invalid characters (use lowercase alphanumeric and hyphens)".into(),
        ));
    }

    if let Some(first) = slug.chars().next() {
        if !first.is_ascii_alphanumeric() {
            return Err(ApiError::BadRequest(
                "Slug must start with a letter or digit".into(),
            ));
        }
    }

    Ok(())
}

/// Validate a required name-like field: non-blank and bounded.
pub fn validate_required(value: &str, field_name: &'static str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::BadRequest(format!(
            "{field_name} cannot be empty"
        )));
    }
    validate_length(value, field_name)
}

/// Validate a user-provided string is within safe bounds.
pub fn validate_length(value: &str, field_name: &'static str) -> Result<(), ApiError> {
    if value.len() > MAX_FIELD_LEN {
        return Err(ApiError::BadRequest(format!(
            "{field_name} too long (max {MAX_FIELD_LEN} chars)"
        )));
    }
    Ok(())
}

/// Validate an optional field when present.
pub fn validate_optional(value: Option<&str>, field_name: &'static str) -> Result<(), ApiError> {
    match value {
        Some(v) => validate_length(v, field_name),
        None => Ok(()),
    }
}

/// Validate free-form text (descriptions, template bodies).
pub fn validate_text(value: &str, field_name: &'static str) -> Result<(), ApiError> {
    if value.len() > MAX_TEXT_LEN {
        return Err(ApiError::BadRequest(format!(
            "{field_name} too long (max {MAX_TEXT_LEN} chars)"
        )));
    }
    Ok(())
}

/// Validate a tag list: bounded count, each tag non-blank and bounded.
pub fn validate_tags(tags: &[String]) -> Result<(), ApiError> {
    if tags.len() > MAX_TAGS {
        return Err(ApiError::BadRequest(format!(
            "Too many tags (max {MAX_TAGS})"
        )));
    }
    for tag in tags {
        validate_required(tag, "tag")?;
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

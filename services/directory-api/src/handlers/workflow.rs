//! Outreach workflow handlers
//!
//! The periodic outreach view and its actions are gated on an active
//! paid subscription. Unlike directory field gating there is no admin
//! override here: the workflow is a paid feature, not a moderation
//! surface.

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use spindex_db::{PersonRepository, PersonRow, TemplateRepository, TemplateRow, UniversityRepository};

use crate::error::{ApiError, ApiResult};
use crate::extractors::AuthUser;
use crate::handlers::shared::require_outreach;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct TemplateView {
    pub id: Uuid,
    pub name: String,
    pub subject: String,
    /// Body text with literal `{{placeholder}}` markers; the sender
    /// fills these in, the service never substitutes
    pub body: String,
}

#[derive(Debug, Serialize)]
pub struct DuePersonView {
    pub id: Uuid,
    pub company_id: Option<Uuid>,
    pub slug: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub tags: Vec<String>,
    pub segment: Option<String>,
    pub last_contacted_at: Option<DateTime<Utc>>,
    pub next_touch_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct OutreachQueueResponse {
    pub university_id: Uuid,
    pub templates: Vec<TemplateView>,
    pub due: Vec<DuePersonView>,
}

#[derive(Debug, Deserialize)]
pub struct MarkContactedRequest {
    /// When to surface this person again; omitting it clears any
    /// scheduled follow-up
    pub next_touch_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct MarkContactedResponse {
    pub id: Uuid,
    pub last_contacted_at: Option<DateTime<Utc>>,
    pub next_touch_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct ComposeQuery {
    pub template_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct ComposeResponse {
    pub email: String,
    pub subject: String,
    pub body: String,
    pub url: String,
}

impl From<TemplateRow> for TemplateView {
    fn from(row: TemplateRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            subject: row.subject,
            body: row.body,
        }
    }
}

impl From<PersonRow> for DuePersonView {
    fn from(row: PersonRow) -> Self {
        Self {
            id: row.id,
            company_id: row.company_id,
            slug: row.slug,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            tags: row.tags,
            segment: row.segment,
            last_contacted_at: row.last_contacted_at,
            next_touch_at: row.next_touch_at,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/directory/{slug}/outreach
///
/// Templates plus everyone due for a touch: next touch date unset or
/// not after the start of today (UTC), soonest first.
pub async fn get_outreach_queue(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    auth: AuthUser,
) -> ApiResult<Json<OutreachQueueResponse>> {
    require_outreach(&auth)?;

    let university = state
        .repos
        .universities
        .find_by_slug(&slug)
        .await?
        .ok_or(ApiError::UniversityNotFound)?;

    let cutoff = Utc::now().date_naive().and_time(NaiveTime::MIN).and_utc();

    let templates = state
        .repos
        .templates
        .find_by_university(university.id)
        .await?;
    let due = state.repos.people.find_due(university.id, cutoff).await?;

    Ok(Json(OutreachQueueResponse {
        university_id: university.id,
        templates: templates.into_iter().map(TemplateView::from).collect(),
        due: due.into_iter().map(DuePersonView::from).collect(),
    }))
}

/// POST /api/v1/people/{id}/contacted
///
/// Record an outreach contact now and schedule (or clear) the next
/// touch.
pub async fn mark_contacted(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth: AuthUser,
    Json(req): Json<MarkContactedRequest>,
) -> ApiResult<Json<MarkContactedResponse>> {
    require_outreach(&auth)?;

    let updated = state.repos.people.mark_contacted(id, req.next_touch_at).await?;
    if updated == 0 {
        return Err(ApiError::PersonNotFound);
    }

    let person = state
        .repos
        .people
        .find_by_id(id)
        .await?
        .ok_or(ApiError::PersonNotFound)?;

    tracing::info!(person_id = %id, user_id = %auth.user_id, "Contact recorded");

    Ok(Json(MarkContactedResponse {
        id: person.id,
        last_contacted_at: person.last_contacted_at,
        next_touch_at: person.next_touch_at,
    }))
}

/// GET /api/v1/people/{id}/compose
///
/// Build the `mailto:` compose link for a person, optionally seeded
/// from a template. The service constructs the link only; nothing is
/// ever sent.
pub async fn compose_email(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<ComposeQuery>,
    auth: AuthUser,
) -> ApiResult<Json<ComposeResponse>> {
    require_outreach(&auth)?;

    let person = state
        .repos
        .people
        .find_by_id(id)
        .await?
        .ok_or(ApiError::PersonNotFound)?;

    let email = person.email.ok_or(ApiError::EmailNotFound)?;

    let (subject, body) = match query.template_id {
        Some(template_id) => {
            let template = state
                .repos
                .templates
                .find_by_id(template_id)
                .await?
                .ok_or(ApiError::TemplateNotFound)?;
            (template.subject, template.body)
        }
        None => (String::new(), String::new()),
    };

    let url = encode_mailto_url(&email, &subject, &body);

    Ok(Json(ComposeResponse {
        email,
        subject,
        body,
        url,
    }))
}

/// Build a `mailto:` URL with percent-encoded subject and body
fn encode_mailto_url(email: &str, subject: &str, body: &str) -> String {
    if subject.is_empty() && body.is_empty() {
        return format!("mailto:{email}");
    }
    format!(
        "mailto:{}?subject={}&body={}",
        email,
        urlencoding::encode(subject),
        urlencoding::encode(body)
    )
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mailto_without_template_is_bare() {
        let url = encode_mailto_url("ada@acme.test", "", "");
        assert_eq!(url, "mailto:ada@acme.test");
    }

    #[test]
    fn test_mailto_percent_encodes_subject_and_body() {
        let url = encode_mailto_url("ada@acme.test", "Quick intro", "Hi Ada,\n\nGreat to meet!");
        assert_eq!(
            url,
            "mailto:ada@acme.test?subject=Quick%20intro&body=Hi%20Ada%2C%0A%0AGreat%20to%20meet%21"
        );
    }

    #[test]
    fn test_mailto_keeps_placeholders_verbatim() {
        let url = encode_mailto_url("ada@acme.test", "Hello {{firstName}}", "");
        assert!(url.contains("subject=Hello%20%7B%7BfirstName%7D%7D"));
    }
}

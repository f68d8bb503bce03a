//! Admin CRUD handlers
//!
//! Every route here requires the administer capability. Writes are
//! whole-entity: update payloads carry the full record, there is no
//! partial patch semantics. Payloads are validated before anything
//! reaches the store.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use spindex_db::{
    CompanyRepository, CompanyRow, CreateCompany, CreatePerson, CreateTemplate, CreateUniversity,
    PersonRepository, PersonRow, TemplateRepository, TemplateRow, UniversityRepository,
    UniversityRow, UpdateCompany, UpdatePerson, UpdateTemplate, UpdateUniversity,
};

use crate::error::{ApiError, ApiResult};
use crate::extractors::AuthUser;
use crate::handlers::shared::{
    require_admin, validate_length, validate_optional, validate_required, validate_slug,
    validate_tags, validate_text, MAX_TAGS,
};
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// University id scope for list endpoints
#[derive(Debug, Deserialize)]
pub struct AdminScopeQuery {
    pub university_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct UniversityPayload {
    pub slug: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateCompanyRequest {
    pub university_id: Uuid,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub website: Option<String>,
    pub linkedin_url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub segment: Option<String>,
    #[serde(default)]
    pub new_this_week: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCompanyRequest {
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub website: Option<String>,
    pub linkedin_url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub segment: Option<String>,
    #[serde(default)]
    pub new_this_week: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreatePersonRequest {
    pub university_id: Uuid,
    pub company_id: Option<Uuid>,
    pub slug: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub linkedin_url: Option<String>,
    pub profile_url: Option<String>,
    #[serde(default)]
    pub other_urls: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub segment: Option<String>,
    #[serde(default)]
    pub new_this_week: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePersonRequest {
    pub company_id: Option<Uuid>,
    pub slug: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub linkedin_url: Option<String>,
    pub profile_url: Option<String>,
    #[serde(default)]
    pub other_urls: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub segment: Option<String>,
    #[serde(default)]
    pub new_this_week: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateTemplateRequest {
    pub university_id: Uuid,
    pub name: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTemplateRequest {
    pub name: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Serialize)]
pub struct AdminUniversityView {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct AdminCompanyView {
    pub id: Uuid,
    pub university_id: Uuid,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub website: Option<String>,
    pub linkedin_url: Option<String>,
    pub tags: Vec<String>,
    pub segment: Option<String>,
    pub new_this_week: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Full person record, email and contact tracking included
#[derive(Debug, Serialize)]
pub struct AdminPersonView {
    pub id: Uuid,
    pub university_id: Uuid,
    pub company_id: Option<Uuid>,
    pub slug: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub linkedin_url: Option<String>,
    pub profile_url: Option<String>,
    pub other_urls: Vec<String>,
    pub tags: Vec<String>,
    pub segment: Option<String>,
    pub new_this_week: bool,
    pub last_contacted_at: Option<DateTime<Utc>>,
    pub next_touch_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct AdminTemplateView {
    pub id: Uuid,
    pub university_id: Uuid,
    pub name: String,
    pub subject: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UniversityRow> for AdminUniversityView {
    fn from(row: UniversityRow) -> Self {
        Self {
            id: row.id,
            slug: row.slug,
            name: row.name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl From<CompanyRow> for AdminCompanyView {
    fn from(row: CompanyRow) -> Self {
        Self {
            id: row.id,
            university_id: row.university_id,
            slug: row.slug,
            name: row.name,
            description: row.description,
            website: row.website,
            linkedin_url: row.linkedin_url,
            tags: row.tags,
            segment: row.segment,
            new_this_week: row.new_this_week,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl From<PersonRow> for AdminPersonView {
    fn from(row: PersonRow) -> Self {
        Self {
            id: row.id,
            university_id: row.university_id,
            company_id: row.company_id,
            slug: row.slug,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            linkedin_url: row.linkedin_url,
            profile_url: row.profile_url,
            other_urls: row.other_urls,
            tags: row.tags,
            segment: row.segment,
            new_this_week: row.new_this_week,
            last_contacted_at: row.last_contacted_at,
            next_touch_at: row.next_touch_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl From<TemplateRow> for AdminTemplateView {
    fn from(row: TemplateRow) -> Self {
        Self {
            id: row.id,
            university_id: row.university_id,
            name: row.name,
            subject: row.subject,
            body: row.body,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

// ============================================================================
// Validation
// ============================================================================

impl UniversityPayload {
    fn validate(&self) -> Result<(), ApiError> {
        validate_slug(&self.slug)?;
        validate_required(&self.name, "name")
    }
}

impl CreateCompanyRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate_company_fields(
            &self.slug,
            &self.name,
            self.description.as_deref(),
            self.website.as_deref(),
            self.linkedin_url.as_deref(),
            &self.tags,
            self.segment.as_deref(),
        )
    }
}

impl UpdateCompanyRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate_company_fields(
            &self.slug,
            &self.name,
            self.description.as_deref(),
            self.website.as_deref(),
            self.linkedin_url.as_deref(),
            &self.tags,
            self.segment.as_deref(),
        )
    }
}

impl CreatePersonRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate_person_fields(
            &self.slug,
            &self.first_name,
            &self.last_name,
            self.email.as_deref(),
            self.linkedin_url.as_deref(),
            self.profile_url.as_deref(),
            &self.other_urls,
            &self.tags,
            self.segment.as_deref(),
        )
    }
}

impl UpdatePersonRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate_person_fields(
            &self.slug,
            &self.first_name,
            &self.last_name,
            self.email.as_deref(),
            self.linkedin_url.as_deref(),
            self.profile_url.as_deref(),
            &self.other_urls,
            &self.tags,
            self.segment.as_deref(),
        )
    }
}

impl CreateTemplateRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate_template_fields(&self.name, &self.subject, &self.body)
    }
}

impl UpdateTemplateRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate_template_fields(&self.name, &self.subject, &self.body)
    }
}

#[allow(clippy::too_many_arguments)]
fn validate_company_fields(
    slug: &str,
    name: &str,
    description: Option<&str>,
    website: Option<&str>,
    linkedin_url: Option<&str>,
    tags: &[String],
    segment: Option<&str>,
) -> Result<(), ApiError> {
    validate_slug(slug)?;
    validate_required(name, "name")?;
    if let Some(d) = description {
        validate_text(d, "description")?;
    }
    validate_optional(website, "website")?;
    validate_optional(linkedin_url, "linkedin_url")?;
    validate_tags(tags)?;
    validate_optional(segment, "segment")
}

#[allow(clippy::too_many_arguments)]
fn validate_person_fields(
    slug: &str,
    first_name: &str,
    last_name: &str,
    email: Option<&str>,
    linkedin_url: Option<&str>,
    profile_url: Option<&str>,
    other_urls: &[String],
    tags: &[String],
    segment: Option<&str>,
) -> Result<(), ApiError> {
    validate_slug(slug)?;
    validate_required(first_name, "first_name")?;
    validate_required(last_name, "last_name")?;
    validate_optional(email, "email")?;
    validate_optional(linkedin_url, "linkedin_url")?;
    validate_optional(profile_url, "profile_url")?;
    validate_url_list(other_urls)?;
    validate_tags(tags)?;
    validate_optional(segment, "segment")
}

fn validate_template_fields(name: &str, subject: &str, body: &str) -> Result<(), ApiError> {
    validate_required(name, "name")?;
    validate_length(subject, "subject")?;
    validate_text(body, "body")
}

fn validate_url_list(urls: &[String]) -> Result<(), ApiError> {
    if urls.len() > MAX_TAGS {
        return Err(ApiError::BadRequest(format!("Too many URLs (max {MAX_TAGS})")));
    }
    for url in urls {
        validate_required(url, "url")?;
    }
    Ok(())
}

// ============================================================================
// University Handlers
// ============================================================================

/// GET /api/v1/admin/universities
pub async fn list_universities(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<Vec<AdminUniversityView>>> {
    require_admin(&auth)?;
    let rows = state.repos.universities.list().await?;
    Ok(Json(rows.into_iter().map(AdminUniversityView::from).collect()))
}

/// POST /api/v1/admin/universities
pub async fn create_university(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<UniversityPayload>,
) -> ApiResult<Json<AdminUniversityView>> {
    require_admin(&auth)?;
    req.validate()?;

    let row = state
        .repos
        .universities
        .create(CreateUniversity {
            id: Uuid::new_v4(),
            slug: req.slug,
            name: req.name,
        })
        .await?;

    tracing::info!(university_id = %row.id, user_id = %auth.user_id, "University created");

    Ok(Json(row.into()))
}

/// PUT /api/v1/admin/universities/{id}
pub async fn update_university(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth: AuthUser,
    Json(req): Json<UniversityPayload>,
) -> ApiResult<Json<AdminUniversityView>> {
    require_admin(&auth)?;
    req.validate()?;

    let row = state
        .repos
        .universities
        .update(
            id,
            UpdateUniversity {
                slug: req.slug,
                name: req.name,
            },
        )
        .await?
        .ok_or(ApiError::UniversityNotFound)?;

    Ok(Json(row.into()))
}

/// DELETE /api/v1/admin/universities/{id}
pub async fn delete_university(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth: AuthUser,
) -> ApiResult<StatusCode> {
    require_admin(&auth)?;

    let deleted = state.repos.universities.delete(id).await?;
    if deleted == 0 {
        return Err(ApiError::UniversityNotFound);
    }

    tracing::info!(university_id = %id, user_id = %auth.user_id, "University deleted");

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Company Handlers
// ============================================================================

/// GET /api/v1/admin/companies?university_id=
pub async fn list_companies(
    State(state): State<AppState>,
    Query(scope): Query<AdminScopeQuery>,
    auth: AuthUser,
) -> ApiResult<Json<Vec<AdminCompanyView>>> {
    require_admin(&auth)?;
    let rows = state
        .repos
        .companies
        .find_by_university(scope.university_id)
        .await?;
    Ok(Json(rows.into_iter().map(AdminCompanyView::from).collect()))
}

/// POST /api/v1/admin/companies
pub async fn create_company(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateCompanyRequest>,
) -> ApiResult<Json<AdminCompanyView>> {
    require_admin(&auth)?;
    req.validate()?;

    state
        .repos
        .universities
        .find_by_id(req.university_id)
        .await?
        .ok_or(ApiError::UniversityNotFound)?;

    let row = state
        .repos
        .companies
        .create(CreateCompany {
            id: Uuid::new_v4(),
            university_id: req.university_id,
            slug: req.slug,
            name: req.name,
            description: req.description,
            website: req.website,
            linkedin_url: req.linkedin_url,
            tags: req.tags,
            segment: req.segment,
            new_this_week: req.new_this_week,
        })
        .await?;

    tracing::info!(company_id = %row.id, user_id = %auth.user_id, "Company created");

    Ok(Json(row.into()))
}

/// PUT /api/v1/admin/companies/{id}
pub async fn update_company(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth: AuthUser,
    Json(req): Json<UpdateCompanyRequest>,
) -> ApiResult<Json<AdminCompanyView>> {
    require_admin(&auth)?;
    req.validate()?;

    let row = state
        .repos
        .companies
        .update(
            id,
            UpdateCompany {
                slug: req.slug,
                name: req.name,
                description: req.description,
                website: req.website,
                linkedin_url: req.linkedin_url,
                tags: req.tags,
                segment: req.segment,
                new_this_week: req.new_this_week,
            },
        )
        .await?
        .ok_or(ApiError::CompanyNotFound)?;

    Ok(Json(row.into()))
}

/// DELETE /api/v1/admin/companies/{id}
pub async fn delete_company(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth: AuthUser,
) -> ApiResult<StatusCode> {
    require_admin(&auth)?;

    let deleted = state.repos.companies.delete(id).await?;
    if deleted == 0 {
        return Err(ApiError::CompanyNotFound);
    }

    tracing::info!(company_id = %id, user_id = %auth.user_id, "Company deleted");

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Person Handlers
// ============================================================================

/// GET /api/v1/admin/people?university_id=
pub async fn list_people(
    State(state): State<AppState>,
    Query(scope): Query<AdminScopeQuery>,
    auth: AuthUser,
) -> ApiResult<Json<Vec<AdminPersonView>>> {
    require_admin(&auth)?;
    let rows = state
        .repos
        .people
        .find_by_university(scope.university_id)
        .await?;
    Ok(Json(rows.into_iter().map(AdminPersonView::from).collect()))
}

/// POST /api/v1/admin/people
pub async fn create_person(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreatePersonRequest>,
) -> ApiResult<Json<AdminPersonView>> {
    require_admin(&auth)?;
    req.validate()?;

    state
        .repos
        .universities
        .find_by_id(req.university_id)
        .await?
        .ok_or(ApiError::UniversityNotFound)?;

    if let Some(company_id) = req.company_id {
        check_company_scope(&state, company_id, req.university_id).await?;
    }

    let row = state
        .repos
        .people
        .create(CreatePerson {
            id: Uuid::new_v4(),
            university_id: req.university_id,
            company_id: req.company_id,
            slug: req.slug,
            first_name: req.first_name,
            last_name: req.last_name,
            email: req.email,
            linkedin_url: req.linkedin_url,
            profile_url: req.profile_url,
            other_urls: req.other_urls,
            tags: req.tags,
            segment: req.segment,
            new_this_week: req.new_this_week,
        })
        .await?;

    tracing::info!(person_id = %row.id, user_id = %auth.user_id, "Person created");

    Ok(Json(row.into()))
}

/// PUT /api/v1/admin/people/{id}
pub async fn update_person(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth: AuthUser,
    Json(req): Json<UpdatePersonRequest>,
) -> ApiResult<Json<AdminPersonView>> {
    require_admin(&auth)?;
    req.validate()?;

    let existing = state
        .repos
        .people
        .find_by_id(id)
        .await?
        .ok_or(ApiError::PersonNotFound)?;

    if let Some(company_id) = req.company_id {
        check_company_scope(&state, company_id, existing.university_id).await?;
    }

    let row = state
        .repos
        .people
        .update(
            id,
            UpdatePerson {
                company_id: req.company_id,
                slug: req.slug,
                first_name: req.first_name,
                last_name: req.last_name,
                email: req.email,
                linkedin_url: req.linkedin_url,
                profile_url: req.profile_url,
                other_urls: req.other_urls,
                tags: req.tags,
                segment: req.segment,
                new_this_week: req.new_this_week,
            },
        )
        .await?
        .ok_or(ApiError::PersonNotFound)?;

    Ok(Json(row.into()))
}

/// DELETE /api/v1/admin/people/{id}
pub async fn delete_person(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth: AuthUser,
) -> ApiResult<StatusCode> {
    require_admin(&auth)?;

    let deleted = state.repos.people.delete(id).await?;
    if deleted == 0 {
        return Err(ApiError::PersonNotFound);
    }

    tracing::info!(person_id = %id, user_id = %auth.user_id, "Person deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// A person's company must exist and live in the same university
async fn check_company_scope(
    state: &AppState,
    company_id: Uuid,
    university_id: Uuid,
) -> Result<(), ApiError> {
    let company = state
        .repos
        .companies
        .find_by_id(company_id)
        .await?
        .ok_or(ApiError::CompanyNotFound)?;

    if company.university_id != university_id {
        return Err(ApiError::BadRequest(
            "Company belongs to a different university".to_string(),
        ));
    }

    Ok(())
}

// ============================================================================
// Template Handlers
// ============================================================================

/// GET /api/v1/admin/templates?university_id=
pub async fn list_templates(
    State(state): State<AppState>,
    Query(scope): Query<AdminScopeQuery>,
    auth: AuthUser,
) -> ApiResult<Json<Vec<AdminTemplateView>>> {
    require_admin(&auth)?;
    let rows = state
        .repos
        .templates
        .find_by_university(scope.university_id)
        .await?;
    Ok(Json(rows.into_iter().map(AdminTemplateView::from).collect()))
}

/// POST /api/v1/admin/templates
pub async fn create_template(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateTemplateRequest>,
) -> ApiResult<Json<AdminTemplateView>> {
    require_admin(&auth)?;
    req.validate()?;

    state
        .repos
        .universities
        .find_by_id(req.university_id)
        .await?
        .ok_or(ApiError::UniversityNotFound)?;

    let row = state
        .repos
        .templates
        .create(CreateTemplate {
            id: Uuid::new_v4(),
            university_id: req.university_id,
            name: req.name,
            subject: req.subject,
            body: req.body,
        })
        .await?;

    tracing::info!(template_id = %row.id, user_id = %auth.user_id, "Template created");

    Ok(Json(row.into()))
}

/// PUT /api/v1/admin/templates/{id}
pub async fn update_template(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth: AuthUser,
    Json(req): Json<UpdateTemplateRequest>,
) -> ApiResult<Json<AdminTemplateView>> {
    require_admin(&auth)?;
    req.validate()?;

    let row = state
        .repos
        .templates
        .update(
            id,
            UpdateTemplate {
                name: req.name,
                subject: req.subject,
                body: req.body,
            },
        )
        .await?
        .ok_or(ApiError::TemplateNotFound)?;

    Ok(Json(row.into()))
}

/// DELETE /api/v1/admin/templates/{id}
pub async fn delete_template(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth: AuthUser,
) -> ApiResult<StatusCode> {
    require_admin(&auth)?;

    let deleted = state.repos.templates.delete(id).await?;
    if deleted == 0 {
        return Err(ApiError::TemplateNotFound);
    }

    tracing::info!(template_id = %id, user_id = %auth.user_id, "Template deleted");

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_university_payload_rejects_blank_name() {
        let payload = UniversityPayload {
            slug: "stanford".to_string(),
            name: "   ".to_string(),
        };
        assert!(matches!(payload.validate(), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn test_company_payload_rejects_bad_slug() {
        let req = UpdateCompanyRequest {
            slug: "Acme Labs".to_string(),
            name: "Acme Labs".to_string(),
            description: None,
            website: None,
            linkedin_url: None,
            tags: vec![],
            segment: None,
            new_this_week: false,
        };
        assert!(matches!(req.validate(), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn test_person_payload_rejects_blank_first_name() {
        let req = UpdatePersonRequest {
            company_id: None,
            slug: "ada-lovelace".to_string(),
            first_name: String::new(),
            last_name: "Lovelace".to_string(),
            email: None,
            linkedin_url: None,
            profile_url: None,
            other_urls: vec![],
            tags: vec![],
            segment: None,
            new_this_week: false,
        };
        assert!(matches!(req.validate(), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn test_person_payload_accepts_minimal_record() {
        let req = UpdatePersonRequest {
            company_id: None,
            slug: "ada-lovelace".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: None,
            linkedin_url: None,
            profile_url: None,
            other_urls: vec![],
            tags: vec![],
            segment: None,
            new_this_week: false,
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_template_payload_allows_empty_subject() {
        let req = UpdateTemplateRequest {
            name: "Intro".to_string(),
            subject: String::new(),
            body: "Hi {{firstName}},".to_string(),
        };
        assert!(req.validate().is_ok());
    }
}

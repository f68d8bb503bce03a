//! Directory browsing handlers
//!
//! Public reads: anyone can browse, filtered or not. Gated fields are
//! redacted in place for callers without a paid entitlement or the
//! admin role; the field key always survives so clients can render a
//! locked state.

use std::collections::BTreeSet;
use std::time::Instant;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use spindex_auth_core::CapabilitySet;
use spindex_db::{
    CompanyRepository, CompanyRow, DirectoryFilter, PersonRepository, PersonRow,
    UniversityRepository, UniversityRow,
};
use spindex_types::Gated;

use crate::error::{ApiError, ApiResult};
use crate::extractors::{AuthUser, OptionalAuthUser};
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct DirectoryQuery {
    pub tag: Option<String>,
    pub segment: Option<String>,
    #[serde(default)]
    pub new_this_week: bool,
}

#[derive(Debug, Serialize)]
pub struct UniversityView {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct CompanyView {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub website: Option<String>,
    pub linkedin_url: Option<String>,
    pub tags: Vec<String>,
    pub segment: Option<String>,
    pub new_this_week: bool,
}

#[derive(Debug, Serialize)]
pub struct PersonView {
    pub id: Uuid,
    pub company_id: Option<Uuid>,
    pub slug: String,
    pub first_name: String,
    pub last_name: String,
    /// `null` when the record has no email; redacted otherwise unless
    /// the caller may view gated fields
    pub email: Option<Gated<String>>,
    pub linkedin_url: Option<String>,
    pub profile_url: Option<String>,
    pub other_urls: Vec<String>,
    pub tags: Vec<String>,
    pub segment: Option<String>,
    pub new_this_week: bool,
}

/// Distinct filter values across the whole university directory
#[derive(Debug, Serialize)]
pub struct Facets {
    pub tags: Vec<String>,
    pub segments: Vec<String>,
}

/// What the caller is allowed to do, echoed for client rendering
#[derive(Debug, Serialize)]
pub struct ViewerContext {
    pub authenticated: bool,
    pub capabilities: CapabilitySet,
}

#[derive(Debug, Serialize)]
pub struct DirectoryResponse {
    pub university: UniversityView,
    pub companies: Vec<CompanyView>,
    pub people: Vec<PersonView>,
    pub facets: Facets,
    pub viewer: ViewerContext,
}

#[derive(Debug, Serialize)]
pub struct CompanyDetailResponse {
    pub university: UniversityView,
    pub company: CompanyView,
    pub people: Vec<PersonView>,
    pub viewer: ViewerContext,
}

#[derive(Debug, Serialize)]
pub struct PersonDetailResponse {
    pub university: UniversityView,
    pub person: PersonView,
    pub company: Option<CompanyView>,
    pub viewer: ViewerContext,
}

impl From<UniversityRow> for UniversityView {
    fn from(row: UniversityRow) -> Self {
        Self {
            id: row.id,
            slug: row.slug,
            name: row.name,
        }
    }
}

impl From<CompanyRow> for CompanyView {
    fn from(row: CompanyRow) -> Self {
        Self {
            id: row.id,
            slug: row.slug,
            name: row.name,
            description: row.description,
            website: row.website,
            linkedin_url: row.linkedin_url,
            tags: row.tags,
            segment: row.segment,
            new_this_week: row.new_this_week,
        }
    }
}

impl PersonView {
    fn from_row(row: PersonRow, can_view_gated: bool) -> Self {
        Self {
            id: row.id,
            company_id: row.company_id,
            slug: row.slug,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email.map(|e| Gated::new(e, can_view_gated)),
            linkedin_url: row.linkedin_url,
            profile_url: row.profile_url,
            other_urls: row.other_urls,
            tags: row.tags,
            segment: row.segment,
            new_this_week: row.new_this_week,
        }
    }
}

fn collect_facets(companies: &[CompanyRow], people: &[PersonRow]) -> Facets {
    let mut tags: BTreeSet<&str> = BTreeSet::new();
    let mut segments: BTreeSet<&str> = BTreeSet::new();

    for company in companies {
        tags.extend(company.tags.iter().map(String::as_str));
        if let Some(segment) = &company.segment {
            segments.insert(segment);
        }
    }
    for person in people {
        tags.extend(person.tags.iter().map(String::as_str));
        if let Some(segment) = &person.segment {
            segments.insert(segment);
        }
    }

    Facets {
        tags: tags.into_iter().map(String::from).collect(),
        segments: segments.into_iter().map(String::from).collect(),
    }
}

fn viewer_capabilities(viewer: &Option<AuthUser>) -> CapabilitySet {
    viewer
        .as_ref()
        .map(|u| u.capabilities)
        .unwrap_or(CapabilitySet::none())
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/directory/{slug}
///
/// Filtered directory listing for a university. Filters are
/// conjunctive; facets always describe the unfiltered directory so the
/// caller can widen a narrowed view.
pub async fn get_directory(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<DirectoryQuery>,
    OptionalAuthUser(viewer): OptionalAuthUser,
) -> ApiResult<Json<DirectoryResponse>> {
    let start = Instant::now();

    let university = state
        .repos
        .universities
        .find_by_slug(&slug)
        .await?
        .ok_or(ApiError::UniversityNotFound)?;

    let capabilities = viewer_capabilities(&viewer);

    let all_companies = state
        .repos
        .companies
        .find_by_university(university.id)
        .await?;
    let all_people = state.repos.people.find_by_university(university.id).await?;
    let facets = collect_facets(&all_companies, &all_people);

    let filter = DirectoryFilter {
        tag: query.tag,
        segment: query.segment,
        new_this_week: query.new_this_week,
    };
    let filtering = filter.tag.is_some() || filter.segment.is_some() || filter.new_this_week;

    let (companies, people) = if filtering {
        (
            state
                .repos
                .companies
                .find_filtered(university.id, &filter)
                .await?,
            state
                .repos
                .people
                .find_filtered(university.id, &filter)
                .await?,
        )
    } else {
        (all_companies, all_people)
    };

    metrics::histogram!("directory_operation_duration_seconds", "operation" => "get_directory")
        .record(start.elapsed().as_secs_f64());

    Ok(Json(DirectoryResponse {
        university: university.into(),
        companies: companies.into_iter().map(CompanyView::from).collect(),
        people: people
            .into_iter()
            .map(|p| PersonView::from_row(p, capabilities.view_gated_fields))
            .collect(),
        facets,
        viewer: ViewerContext {
            authenticated: viewer.is_some(),
            capabilities,
        },
    }))
}

/// GET /api/v1/directory/{slug}/companies/{company_slug}
///
/// Company detail with the people working there.
pub async fn get_company(
    State(state): State<AppState>,
    Path((slug, company_slug)): Path<(String, String)>,
    OptionalAuthUser(viewer): OptionalAuthUser,
) -> ApiResult<Json<CompanyDetailResponse>> {
    let university = state
        .repos
        .universities
        .find_by_slug(&slug)
        .await?
        .ok_or(ApiError::UniversityNotFound)?;

    let company = state
        .repos
        .companies
        .find_by_slug(university.id, &company_slug)
        .await?
        .ok_or(ApiError::CompanyNotFound)?;

    let people = state.repos.people.find_by_company(company.id).await?;

    let capabilities = viewer_capabilities(&viewer);

    Ok(Json(CompanyDetailResponse {
        university: university.into(),
        company: company.into(),
        people: people
            .into_iter()
            .map(|p| PersonView::from_row(p, capabilities.view_gated_fields))
            .collect(),
        viewer: ViewerContext {
            authenticated: viewer.is_some(),
            capabilities,
        },
    }))
}

/// GET /api/v1/directory/{slug}/people/{person_slug}
///
/// Person detail with their company, if any.
pub async fn get_person(
    State(state): State<AppState>,
    Path((slug, person_slug)): Path<(String, String)>,
    OptionalAuthUser(viewer): OptionalAuthUser,
) -> ApiResult<Json<PersonDetailResponse>> {
    let university = state
        .repos
        .universities
        .find_by_slug(&slug)
        .await?
        .ok_or(ApiError::UniversityNotFound)?;

    let person = state
        .repos
        .people
        .find_by_slug(university.id, &person_slug)
        .await?
        .ok_or(ApiError::PersonNotFound)?;

    let company = match person.company_id {
        Some(company_id) => state
            .repos
            .companies
            .find_by_id(company_id)
            .await?
            .map(CompanyView::from),
        None => None,
    };

    let capabilities = viewer_capabilities(&viewer);

    Ok(Json(PersonDetailResponse {
        university: university.into(),
        person: PersonView::from_row(person, capabilities.view_gated_fields),
        company,
        viewer: ViewerContext {
            authenticated: viewer.is_some(),
            capabilities,
        },
    }))
}

// ============================================================================
// Tests
// ============================================================================

//! Repository traits
//!
//! Define async repository interfaces for database operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use spindex_types::{Plan, SubscriptionStatus};
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::*;

/// Subscription repository trait
///
/// One row per user. Writes are full snapshot replacements guarded by
/// the event timestamp so that a late-arriving older event can never
/// overwrite the effects of a newer one.
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Find the subscription record for a user
    async fn get(&self, user_id: &str) -> DbResult<Option<SubscriptionRow>>;

    /// Insert or fully replace the subscription record for a user
    ///
    /// Returns the stored row, or `None` when the write was skipped
    /// because the stored record reflects a newer lifecycle event.
    async fn upsert(&self, sub: SubscriptionUpsert) -> DbResult<Option<SubscriptionRow>>;
}

/// Subscription upsert input
///
/// `last_event_at` carries the processor event timestamp for writes
/// driven by webhook events. Locally initiated writes must carry the
/// stored record's timestamp through unchanged (or `None` for a record
/// that has never seen an event).
#[derive(Debug, Clone)]
pub struct SubscriptionUpsert {
    pub user_id: String,
    pub stripe_customer_id: Option<String>,
    pub stripe_subscription_id: Option<String>,
    pub status: SubscriptionStatus,
    pub plan: Option<Plan>,
    pub current_period_end: Option<DateTime<Utc>>,
    pub last_event_at: Option<DateTime<Utc>>,
}

/// Directory listing filter
///
/// All criteria are conjunctive. `tag` matches rows whose tag array
/// contains the value; `segment` is an exact match.
#[derive(Debug, Clone, Default)]
pub struct DirectoryFilter {
    pub tag: Option<String>,
    pub segment: Option<String>,
    pub new_this_week: bool,
}

/// University repository trait
#[async_trait]
pub trait UniversityRepository: Send + Sync {
    /// Find a university by ID
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<UniversityRow>>;

    /// Find a university by slug
    async fn find_by_slug(&self, slug: &str) -> DbResult<Option<UniversityRow>>;

    /// List all universities
    async fn list(&self) -> DbResult<Vec<UniversityRow>>;

    /// Create a new university
    async fn create(&self, university: CreateUniversity) -> DbResult<UniversityRow>;

    /// Update a university
    async fn update(&self, id: Uuid, university: UpdateUniversity)
        -> DbResult<Option<UniversityRow>>;

    /// Delete a university, returning the number of rows removed
    async fn delete(&self, id: Uuid) -> DbResult<u64>;
}

/// Create university input
#[derive(Debug, Clone)]
pub struct CreateUniversity {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
}

/// Update university input
#[derive(Debug, Clone)]
pub struct UpdateUniversity {
    pub slug: String,
    pub name: String,
}

/// Company repository trait
#[async_trait]
pub trait CompanyRepository: Send + Sync {
    /// Find a company by ID
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<CompanyRow>>;

    /// Find a company by slug within a university
    async fn find_by_slug(&self, university_id: Uuid, slug: &str) -> DbResult<Option<CompanyRow>>;

    /// List all companies for a university, ordered by name
    async fn find_by_university(&self, university_id: Uuid) -> DbResult<Vec<CompanyRow>>;

    /// List companies for a university matching a filter, ordered by name
    async fn find_filtered(
        &self,
        university_id: Uuid,
        filter: &DirectoryFilter,
    ) -> DbResult<Vec<CompanyRow>>;

    /// Create a new company
    async fn create(&self, company: CreateCompany) -> DbResult<CompanyRow>;

    /// Update a company
    async fn update(&self, id: Uuid, company: UpdateCompany) -> DbResult<Option<CompanyRow>>;

    /// Delete a company, returning the number of rows removed
    async fn delete(&self, id: Uuid) -> DbResult<u64>;
}

/// Create company input
#[derive(Debug, Clone)]
pub struct CreateCompany {
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
}

/// Update company input
#[derive(Debug, Clone)]
pub struct UpdateCompany {
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub website: Option<String>,
    pub linkedin_url: Option<String>,
    pub tags: Vec<String>,
    pub segment: Option<String>,
    pub new_this_week: bool,
}

/// Person repository trait
#[async_trait]
pub trait PersonRepository: Send + Sync {
    /// Find a person by ID
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<PersonRow>>;

    /// Find a person by slug within a university
    async fn find_by_slug(&self, university_id: Uuid, slug: &str) -> DbResult<Option<PersonRow>>;

    /// List all people for a university, ordered by last name
    async fn find_by_university(&self, university_id: Uuid) -> DbResult<Vec<PersonRow>>;

    /// List all people at a company, ordered by last name
    async fn find_by_company(&self, company_id: Uuid) -> DbResult<Vec<PersonRow>>;

    /// List people for a university matching a filter, ordered by last name
    async fn find_filtered(
        &self,
        university_id: Uuid,
        filter: &DirectoryFilter,
    ) -> DbResult<Vec<PersonRow>>;

    /// List people due for outreach at the cutoff, soonest first
    ///
    /// A person is due when their next touch date is unset or does not
    /// lie after the cutoff.
    async fn find_due(&self, university_id: Uuid, cutoff: DateTime<Utc>)
        -> DbResult<Vec<PersonRow>>;

    /// Record an outreach contact, returning the number of rows touched
    ///
    /// Sets the last contacted timestamp to now and replaces the
    /// follow-up date, clearing it when `next_touch_at` is `None`.
    async fn mark_contacted(
        &self,
        id: Uuid,
        next_touch_at: Option<DateTime<Utc>>,
    ) -> DbResult<u64>;

    /// Create a new person
    async fn create(&self, person: CreatePerson) -> DbResult<PersonRow>;

    /// Update a person
    async fn update(&self, id: Uuid, person: UpdatePerson) -> DbResult<Option<PersonRow>>;

    /// Delete a person, returning the number of rows removed
    async fn delete(&self, id: Uuid) -> DbResult<u64>;
}

/// Create person input
#[derive(Debug, Clone)]
pub struct CreatePerson {
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
}

/// Update person input
#[derive(Debug, Clone)]
pub struct UpdatePerson {
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
}

/// Outreach template repository trait
#[async_trait]
pub trait TemplateRepository: Send + Sync {
    /// Find a template by ID
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<TemplateRow>>;

    /// List all templates for a university, ordered by name
    async fn find_by_university(&self, university_id: Uuid) -> DbResult<Vec<TemplateRow>>;

    /// Create a new template
    async fn create(&self, template: CreateTemplate) -> DbResult<TemplateRow>;

    /// Update a template
    async fn update(&self, id: Uuid, template: UpdateTemplate) -> DbResult<Option<TemplateRow>>;

    /// Delete a template, returning the number of rows removed
    async fn delete(&self, id: Uuid) -> DbResult<u64>;
}

/// Create template input
#[derive(Debug, Clone)]
pub struct CreateTemplate {
    pub id: Uuid,
    pub university_id: Uuid,
    pub name: String,
    pub subject: String,
    pub body: String,
}

/// Update template input
#[derive(Debug, Clone)]
pub struct UpdateTemplate {
    pub name: String,
    pub subject: String,
    pub body: String,
}

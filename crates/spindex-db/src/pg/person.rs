//! PostgreSQL person repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::PersonRow;
use crate::repo::{CreatePerson, DirectoryFilter, PersonRepository, UpdatePerson};

/// PostgreSQL person repository
#[derive(Clone)]
pub struct PgPersonRepository {
    pool: PgPool,
}

impl PgPersonRepository {
    /// Create a new person repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PersonRepository for PgPersonRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<PersonRow>> {
        let row = sqlx::query_as::<_, PersonRow>(
            r#"
            SELECT id, university_id, company_id, slug, first_name, last_name, email,
                   linkedin_url, profile_url, other_urls, tags, segment, new_this_week,
                   last_contacted_at, next_touch_at, created_at, updated_at
            FROM people
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn find_by_slug(&self, university_id: Uuid, slug: &str) -> DbResult<Option<PersonRow>> {
        let row = sqlx::query_as::<_, PersonRow>(
            r#"
            SELECT id, university_id, company_id, slug, first_name, last_name, email,
                   linkedin_url, profile_url, other_urls, tags, segment, new_this_week,
                   last_contacted_at, next_touch_at, created_at, updated_at
            FROM people
            WHERE university_id = $1 AND slug = $2
            "#,
        )
        .bind(university_id)
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn find_by_university(&self, university_id: Uuid) -> DbResult<Vec<PersonRow>> {
        let rows = sqlx::query_as::<_, PersonRow>(
            r#"
            SELECT id, university_id, company_id, slug, first_name, last_name, email,
                   linkedin_url, profile_url, other_urls, tags, segment, new_this_week,
                   last_contacted_at, next_touch_at, created_at, updated_at
            FROM people
            WHERE university_id = $1
            ORDER BY last_name ASC, first_name ASC
            "#,
        )
        .bind(university_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn find_by_company(&self, company_id: Uuid) -> DbResult<Vec<PersonRow>> {
        let rows = sqlx::query_as::<_, PersonRow>(
            r#"
            SELECT id, university_id, company_id, slug, first_name, last_name, email,
                   linkedin_url, profile_url, other_urls, tags, segment, new_this_week,
                   last_contacted_at, next_touch_at, created_at, updated_at
            FROM people
            WHERE company_id = $1
            ORDER BY last_name ASC, first_name ASC
            "#,
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn find_filtered(
        &self,
        university_id: Uuid,
        filter: &DirectoryFilter,
    ) -> DbResult<Vec<PersonRow>> {
        let rows = sqlx::query_as::<_, PersonRow>(
            r#"
            SELECT id, university_id, company_id, slug, first_name, last_name, email,
                   linkedin_url, profile_url, other_urls, tags, segment, new_this_week,
                   last_contacted_at, next_touch_at, created_at, updated_at
            FROM people
            WHERE university_id = $1
              AND ($2::text IS NULL OR $2 = ANY(tags))
              AND ($3::text IS NULL OR segment = $3)
              AND (NOT $4 OR new_this_week)
            ORDER BY last_name ASC, first_name ASC
            "#,
        )
        .bind(university_id)
        .bind(&filter.tag)
        .bind(&filter.segment)
        .bind(filter.new_this_week)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn find_due(
        &self,
        university_id: Uuid,
        cutoff: DateTime<Utc>,
    ) -> DbResult<Vec<PersonRow>> {
        let rows = sqlx::query_as::<_, PersonRow>(
            r#"
            SELECT id, university_id, company_id, slug, first_name, last_name, email,
                   linkedin_url, profile_url, other_urls, tags, segment, new_this_week,
                   last_contacted_at, next_touch_at, created_at, updated_at
            FROM people
            WHERE university_id = $1
              AND (next_touch_at IS NULL OR next_touch_at <= $2)
            ORDER BY next_touch_at ASC
            "#,
        )
        .bind(university_id)
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn mark_contacted(
        &self,
        id: Uuid,
        next_touch_at: Option<DateTime<Utc>>,
    ) -> DbResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE people
            SET last_contacted_at = NOW(),
                next_touch_at = $2,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(next_touch_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn create(&self, person: CreatePerson) -> DbResult<PersonRow> {
        let row = sqlx::query_as::<_, PersonRow>(
            r#"
            INSERT INTO people (id, university_id, company_id, slug, first_name, last_name,
                                email, linkedin_url, profile_url, other_urls, tags, segment,
                                new_this_week)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING id, university_id, company_id, slug, first_name, last_name, email,
                      linkedin_url, profile_url, other_urls, tags, segment, new_this_week,
                      last_contacted_at, next_touch_at, created_at, updated_at
            "#,
        )
        .bind(person.id)
        .bind(person.university_id)
        .bind(person.company_id)
        .bind(&person.slug)
        .bind(&person.first_name)
        .bind(&person.last_name)
        .bind(&person.email)
        .bind(&person.linkedin_url)
        .bind(&person.profile_url)
        .bind(&person.other_urls)
        .bind(&person.tags)
        .bind(&person.segment)
        .bind(person.new_this_week)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn update(&self, id: Uuid, person: UpdatePerson) -> DbResult<Option<PersonRow>> {
        let row = sqlx::query_as::<_, PersonRow>(
            r#"
            UPDATE people
            SET company_id = $1, slug = $2, first_name = $3, last_name = $4, email = $5,
                linkedin_url = $6, profile_url = $7, other_urls = $8, tags = $9,
                segment = $10, new_this_week = $11, updated_at = NOW()
            WHERE id = $12
            RETURNING id, university_id, company_id, slug, first_name, last_name, email,
                      linkedin_url, profile_url, other_urls, tags, segment, new_this_week,
                      last_contacted_at, next_touch_at, created_at, updated_at
            "#,
        )
        .bind(person.company_id)
        .bind(&person.slug)
        .bind(&person.first_name)
        .bind(&person.last_name)
        .bind(&person.email)
        .bind(&person.linkedin_url)
        .bind(&person.profile_url)
        .bind(&person.other_urls)
        .bind(&person.tags)
        .bind(&person.segment)
        .bind(person.new_this_week)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn delete(&self, id: Uuid) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM people WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

//! PostgreSQL company repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::CompanyRow;
use crate::repo::{CompanyRepository, CreateCompany, DirectoryFilter, UpdateCompany};

/// PostgreSQL company repository
#[derive(Clone)]
pub struct PgCompanyRepository {
    pool: PgPool,
}

impl PgCompanyRepository {
    /// Create a new company repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CompanyRepository for PgCompanyRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<CompanyRow>> {
        let row = sqlx::query_as::<_, CompanyRow>(
            r#"
            SELECT id, university_id, slug, name, description, website, linkedin_url,
                   tags, segment, new_this_week, created_at, updated_at
            FROM companies
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn find_by_slug(&self, university_id: Uuid, slug: &str) -> DbResult<Option<CompanyRow>> {
        let row = sqlx::query_as::<_, CompanyRow>(
            r#"
            SELECT id, university_id, slug, name, description, website, linkedin_url,
                   tags, segment, new_this_week, created_at, updated_at
            FROM companies
            WHERE university_id = $1 AND slug = $2
            "#,
        )
        .bind(university_id)
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn find_by_university(&self, university_id: Uuid) -> DbResult<Vec<CompanyRow>> {
        let rows = sqlx::query_as::<_, CompanyRow>(
            r#"
            SELECT id, university_id, slug, name, description, website, linkedin_url,
                   tags, segment, new_this_week, created_at, updated_at
            FROM companies
            WHERE university_id = $1
            ORDER BY name ASC
            "#,
        )
        .bind(university_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn find_filtered(
        &self,
        university_id: Uuid,
        filter: &DirectoryFilter,
    ) -> DbResult<Vec<CompanyRow>> {
        let rows = sqlx::query_as::<_, CompanyRow>(
            r#"
            SELECT id, university_id, slug, name, description, website, linkedin_url,
                   tags, segment, new_this_week, created_at, updated_at
            FROM companies
            WHERE university_id = $1
              AND ($2::text IS NULL OR $2 = ANY(tags))
              AND ($3::text IS NULL OR segment = $3)
              AND (NOT $4 OR new_this_week)
            ORDER BY name ASC
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

    async fn create(&self, company: CreateCompany) -> DbResult<CompanyRow> {
        let row = sqlx::query_as::<_, CompanyRow>(
            r#"
            INSERT INTO companies (id, university_id, slug, name, description, website,
                                   linkedin_url, tags, segment, new_this_week)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id, university_id, slug, name, description, website, linkedin_url,
                      tags, segment, new_this_week, created_at, updated_at
            "#,
        )
        .bind(company.id)
        .bind(company.university_id)
        .bind(&company.slug)
        .bind(&company.name)
        .bind(&company.description)
        .bind(&company.website)
        .bind(&company.linkedin_url)
        .bind(&company.tags)
        .bind(&company.segment)
        .bind(company.new_this_week)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn update(&self, id: Uuid, company: UpdateCompany) -> DbResult<Option<CompanyRow>> {
        let row = sqlx::query_as::<_, CompanyRow>(
            r#"
            UPDATE companies
            SET slug = $1, name = $2, description = $3, website = $4, linkedin_url = $5,
                tags = $6, segment = $7, new_this_week = $8, updated_at = NOW()
            WHERE id = $9
            RETURNING id, university_id, slug, name, description, website, linkedin_url,
                      tags, segment, new_this_week, created_at, updated_at
            "#,
        )
        .bind(&company.slug)
        .bind(&company.name)
        .bind(&company.description)
        .bind(&company.website)
        .bind(&company.linkedin_url)
        .bind(&company.tags)
        .bind(&company.segment)
        .bind(company.new_this_week)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn delete(&self, id: Uuid) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM companies WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

//! PostgreSQL outreach template repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::TemplateRow;
use crate::repo::{CreateTemplate, TemplateRepository, UpdateTemplate};

/// PostgreSQL outreach template repository
#[derive(Clone)]
pub struct PgTemplateRepository {
    pool: PgPool,
}

impl PgTemplateRepository {
    /// Create a new template repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TemplateRepository for PgTemplateRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<TemplateRow>> {
        let row = sqlx::query_as::<_, TemplateRow>(
            r#"
            SELECT id, university_id, name, subject, body, created_at, updated_at
            FROM templates
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn find_by_university(&self, university_id: Uuid) -> DbResult<Vec<TemplateRow>> {
        let rows = sqlx::query_as::<_, TemplateRow>(
            r#"
            SELECT id, university_id, name, subject, body, created_at, updated_at
            FROM templates
            WHERE university_id = $1
            ORDER BY name ASC
            "#,
        )
        .bind(university_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn create(&self, template: CreateTemplate) -> DbResult<TemplateRow> {
        let row = sqlx::query_as::<_, TemplateRow>(
            r#"
            INSERT INTO templates (id, university_id, name, subject, body)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, university_id, name, subject, body, created_at, updated_at
            "#,
        )
        .bind(template.id)
        .bind(template.university_id)
        .bind(&template.name)
        .bind(&template.subject)
        .bind(&template.body)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn update(&self, id: Uuid, template: UpdateTemplate) -> DbResult<Option<TemplateRow>> {
        let row = sqlx::query_as::<_, TemplateRow>(
            r#"
            UPDATE templates
            SET name = $1, subject = $2, body = $3, updated_at = NOW()
            WHERE id = $4
            RETURNING id, university_id, name, subject, body, created_at, updated_at
            "#,
        )
        .bind(&template.name)
        .bind(&template.subject)
        .bind(&template.body)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn delete(&self, id: Uuid) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM templates WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

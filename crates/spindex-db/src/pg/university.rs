//! PostgreSQL university repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::UniversityRow;
use crate::repo::{CreateUniversity, UniversityRepository, UpdateUniversity};

/// PostgreSQL university repository
#[derive(Clone)]
pub struct PgUniversityRepository {
    pool: PgPool,
}

impl PgUniversityRepository {
    /// Create a new university repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UniversityRepository for PgUniversityRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<UniversityRow>> {
        let row = sqlx::query_as::<_, UniversityRow>(
            "SELECT id, slug, name, created_at, updated_at FROM universities WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn find_by_slug(&self, slug: &str) -> DbResult<Option<UniversityRow>> {
        let row = sqlx::query_as::<_, UniversityRow>(
            "SELECT id, slug, name, created_at, updated_at FROM universities WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn list(&self) -> DbResult<Vec<UniversityRow>> {
        let rows = sqlx::query_as::<_, UniversityRow>(
            "SELECT id, slug, name, created_at, updated_at FROM universities ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn create(&self, university: CreateUniversity) -> DbResult<UniversityRow> {
        let row = sqlx::query_as::<_, UniversityRow>(
            r#"
            INSERT INTO universities (id, slug, name)
            VALUES ($1, $2, $3)
            RETURNING id, slug, name, created_at, updated_at
            "#,
        )
        .bind(university.id)
        .bind(&university.slug)
        .bind(&university.name)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn update(
        &self,
        id: Uuid,
        university: UpdateUniversity,
    ) -> DbResult<Option<UniversityRow>> {
        let row = sqlx::query_as::<_, UniversityRow>(
            r#"
            UPDATE universities
            SET slug = $1, name = $2, updated_at = NOW()
            WHERE id = $3
            RETURNING id, slug, name, created_at, updated_at
            "#,
        )
        .bind(&university.slug)
        .bind(&university.name)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn delete(&self, id: Uuid) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM universities WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

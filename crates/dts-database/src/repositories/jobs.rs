//! Repository for the `jobs` table.

use crate::models::JobRow;
use chrono::{DateTime, Utc};
use dts_core::error::{Error, Result};
use dts_core::pagination::Page;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct JobRepository {
    pool: PgPool,
}

impl JobRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, job: JobRow) -> Result<JobRow> {
        sqlx::query_as::<_, JobRow>(
            r#"
            INSERT INTO jobs (id, name, description, cron_expression, status, created_at, updated_at, last_run, next_run, metadata)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id, name, description, cron_expression, status, created_at, updated_at, last_run, next_run, metadata
            "#,
        )
        .bind(job.id)
        .bind(&job.name)
        .bind(&job.description)
        .bind(&job.cron_expression)
        .bind(&job.status)
        .bind(job.created_at)
        .bind(job.updated_at)
        .bind(job.last_run)
        .bind(job.next_run)
        .bind(&job.metadata)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| Error::database_with_source("failed to create job", e))
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<JobRow>> {
        sqlx::query_as::<_, JobRow>("SELECT * FROM jobs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Error::database_with_source("failed to find job", e))
    }

    pub async fn update(&self, job: JobRow) -> Result<JobRow> {
        sqlx::query_as::<_, JobRow>(
            r#"
            UPDATE jobs SET
                name = $2, description = $3, cron_expression = $4, status = $5,
                updated_at = $6, last_run = $7, next_run = $8, metadata = $9
            WHERE id = $1
            RETURNING id, name, description, cron_expression, status, created_at, updated_at, last_run, next_run, metadata
            "#,
        )
        .bind(job.id)
        .bind(&job.name)
        .bind(&job.description)
        .bind(&job.cron_expression)
        .bind(&job.status)
        .bind(job.updated_at)
        .bind(job.last_run)
        .bind(job.next_run)
        .bind(&job.metadata)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Error::database_with_source("failed to update job", e))?
        .ok_or_else(|| Error::not_found("Job", job.id.to_string()))
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM jobs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| Error::database_with_source("failed to delete job", e))?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found("Job", id.to_string()));
        }
        Ok(())
    }

    /// Cursor-paginated listing: `id > after` ordered by `id`, optionally
    /// filtered by status (spec §4.1).
    pub async fn list_page(
        &self,
        after: Option<Uuid>,
        status: Option<&str>,
        page_size: u32,
    ) -> Result<Page<JobRow>> {
        let rows: Vec<JobRow> = match (after, status) {
            (Some(after), Some(status)) => {
                sqlx::query_as("SELECT * FROM jobs WHERE id > $1 AND status = $2 ORDER BY id LIMIT $3")
                    .bind(after)
                    .bind(status)
                    .bind(page_size as i64)
                    .fetch_all(&self.pool)
                    .await
            }
            (Some(after), None) => {
                sqlx::query_as("SELECT * FROM jobs WHERE id > $1 ORDER BY id LIMIT $2")
                    .bind(after)
                    .bind(page_size as i64)
                    .fetch_all(&self.pool)
                    .await
            }
            (None, Some(status)) => {
                sqlx::query_as("SELECT * FROM jobs WHERE status = $1 ORDER BY id LIMIT $2")
                    .bind(status)
                    .bind(page_size as i64)
                    .fetch_all(&self.pool)
                    .await
            }
            (None, None) => {
                sqlx::query_as("SELECT * FROM jobs ORDER BY id LIMIT $1")
                    .bind(page_size as i64)
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(|e| Error::database_with_source("failed to list jobs", e))?;

        let next_cursor = rows.last().map(|r| r.id);
        Ok(Page::new(rows, next_cursor))
    }

    /// Jobs due at exactly `t` with status `PENDING`, bounded to 100 per
    /// the scheduler's per-tick cap (spec §4.3).
    pub async fn find_due(&self, t: DateTime<Utc>) -> Result<Vec<JobRow>> {
        sqlx::query_as::<_, JobRow>(
            "SELECT * FROM jobs WHERE status = 'PENDING' AND next_run = $1 ORDER BY id LIMIT 100",
        )
        .bind(t)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Error::database_with_source("failed to query due jobs", e))
    }
}

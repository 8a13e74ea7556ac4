//! Repository for the `job_executions` table.

use crate::models::ExecutionRow;
use dts_core::error::{Error, Result};
use dts_core::pagination::Page;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct ExecutionRepository {
    pool: PgPool,
}

impl ExecutionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, execution: ExecutionRow) -> Result<ExecutionRow> {
        sqlx::query_as::<_, ExecutionRow>(
            r#"
            INSERT INTO job_executions (id, job_id, status, start_time, end_time, result, error)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, job_id, status, start_time, end_time, result, error
            "#,
        )
        .bind(execution.id)
        .bind(execution.job_id)
        .bind(&execution.status)
        .bind(execution.start_time)
        .bind(execution.end_time)
        .bind(&execution.result)
        .bind(&execution.error)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| Error::database_with_source("failed to create execution", e))
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<ExecutionRow>> {
        sqlx::query_as::<_, ExecutionRow>("SELECT * FROM job_executions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Error::database_with_source("failed to find execution", e))
    }

    /// Transitions an execution to a terminal state exactly once (spec
    /// §3.2: frozen after the first terminal transition).
    pub async fn complete(
        &self,
        id: Uuid,
        status: &str,
        end_time: chrono::DateTime<chrono::Utc>,
        result: Option<&str>,
        error: Option<&str>,
    ) -> Result<ExecutionRow> {
        sqlx::query_as::<_, ExecutionRow>(
            r#"
            UPDATE job_executions SET status = $2, end_time = $3, result = $4, error = $5
            WHERE id = $1 AND status = 'RUNNING'
            RETURNING id, job_id, status, start_time, end_time, result, error
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(end_time)
        .bind(result)
        .bind(error)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Error::database_with_source("failed to complete execution", e))?
        .ok_or_else(|| Error::not_found("Execution", id.to_string()))
    }

    pub async fn list_page(
        &self,
        after: Option<Uuid>,
        job_id: Option<Uuid>,
        status: Option<&str>,
        page_size: u32,
    ) -> Result<Page<ExecutionRow>> {
        let mut query = String::from("SELECT * FROM job_executions WHERE 1=1");
        let mut idx = 1;

        if after.is_some() {
            idx += 1;
            query.push_str(&format!(" AND id > ${idx}"));
        }
        if job_id.is_some() {
            idx += 1;
            query.push_str(&format!(" AND job_id = ${idx}"));
        }
        if status.is_some() {
            idx += 1;
            query.push_str(&format!(" AND status = ${idx}"));
        }
        query.push_str(" ORDER BY id LIMIT $1");

        let mut q = sqlx::query_as::<_, ExecutionRow>(&query).bind(page_size as i64);
        if let Some(after) = after {
            q = q.bind(after);
        }
        if let Some(job_id) = job_id {
            q = q.bind(job_id);
        }
        if let Some(status) = status {
            q = q.bind(status);
        }

        let rows = q
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Error::database_with_source("failed to list executions", e))?;

        let next_cursor = rows.last().map(|r| r.id);
        Ok(Page::new(rows, next_cursor))
    }

    /// Sweeps `RUNNING` executions whose `start_time` is older than
    /// `stale_after` back to a retryable state (the stale-reservation
    /// sweep of SPEC_FULL §12).
    pub async fn find_stale_running(
        &self,
        stale_after: chrono::DateTime<chrono::Utc>,
    ) -> Result<Vec<ExecutionRow>> {
        sqlx::query_as::<_, ExecutionRow>(
            "SELECT * FROM job_executions WHERE status = 'RUNNING' AND start_time < $1",
        )
        .bind(stale_after)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Error::database_with_source("failed to query stale executions", e))
    }
}

//! Repository for the `scheduled_jobs` reservation table (optional;
//! spec §4.6 marks it as an optional reservation record, used only when
//! the resource-allocation gate is exercised via `SchedulerService`).

use crate::models::ScheduledJobRow;
use dts_core::error::{Error, Result};
use dts_core::pagination::Page;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct ScheduledJobRepository {
    pool: PgPool,
}

impl ScheduledJobRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, row: ScheduledJobRow) -> Result<ScheduledJobRow> {
        sqlx::query_as::<_, ScheduledJobRow>(
            r#"
            INSERT INTO scheduled_jobs (id, job_data, cpu, memory, storage, start_time)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, job_data, cpu, memory, storage, start_time
            "#,
        )
        .bind(row.id)
        .bind(&row.job_data)
        .bind(row.cpu)
        .bind(row.memory)
        .bind(row.storage)
        .bind(row.start_time)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| Error::database_with_source("failed to create scheduled job reservation", e))
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<ScheduledJobRow>> {
        sqlx::query_as::<_, ScheduledJobRow>("SELECT * FROM scheduled_jobs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Error::database_with_source("failed to find scheduled job", e))
    }

    /// Cursor-paginated listing: `id > after` ordered by `id` (spec §6.1's
    /// `ListScheduledJobs`, clamped to 100 by the service layer).
    pub async fn list_page(&self, after: Option<Uuid>, page_size: u32) -> Result<Page<ScheduledJobRow>> {
        let rows: Vec<ScheduledJobRow> = match after {
            Some(after) => {
                sqlx::query_as("SELECT * FROM scheduled_jobs WHERE id > $1 ORDER BY id LIMIT $2")
                    .bind(after)
                    .bind(page_size as i64)
                    .fetch_all(&self.pool)
                    .await
            }
            None => {
                sqlx::query_as("SELECT * FROM scheduled_jobs ORDER BY id LIMIT $1")
                    .bind(page_size as i64)
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(|e| Error::database_with_source("failed to list scheduled jobs", e))?;

        let next_cursor = rows.last().map(|r| r.id);
        Ok(Page::new(rows, next_cursor))
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM scheduled_jobs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| Error::database_with_source("failed to delete scheduled job", e))?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found("ScheduledJob", id.to_string()));
        }
        Ok(())
    }
}

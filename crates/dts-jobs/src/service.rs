//! `JobService`: the RPC-shaped surface of spec §4.1/§6.1.

use crate::cron::CronExpression;
use crate::job::{Job, JobStatus};
use chrono::Utc;
use dts_core::error::{Error, Result};
use dts_core::pagination::{clamp_page_size, Page};
use dts_database::repositories::JobRepository;
use std::collections::HashMap;
use uuid::Uuid;

const DEFAULT_PAGE_SIZE: u32 = 250;
const MAX_PAGE_SIZE: u32 = 250;

#[derive(Debug, Default)]
pub struct UpdateJobRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub cron_expression: Option<String>,
    pub status: Option<JobStatus>,
    pub metadata: Option<HashMap<String, String>>,
    pub last_run: Option<chrono::DateTime<Utc>>,
}

#[derive(Clone)]
pub struct JobService {
    repository: JobRepository,
}

impl JobService {
    pub fn new(repository: JobRepository) -> Self {
        Self { repository }
    }

    pub async fn create_job(
        &self,
        name: String,
        description: Option<String>,
        cron_expression: String,
        metadata: HashMap<String, String>,
    ) -> Result<Job> {
        let job = Job::create(name, description, cron_expression, metadata, Utc::now())?;
        let row = self.repository.create(job.into_row()).await?;
        Job::try_from(row)
    }

    pub async fn get_job(&self, id: Uuid) -> Result<Job> {
        let row = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| Error::not_found("Job", id.to_string()))?;
        Job::try_from(row)
    }

    /// `page_size` clamps to `[1, 250]`, default 250 (spec §4.1/§8).
    pub async fn list_jobs(
        &self,
        page_size: i64,
        status: Option<&str>,
        last_id: Option<Uuid>,
    ) -> Result<Page<Job>> {
        let page_size = clamp_page_size(page_size, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE);
        let page = self.repository.list_page(last_id, status, page_size).await?;

        let items = page
            .items
            .into_iter()
            .map(Job::try_from)
            .collect::<Result<Vec<_>>>()?;

        Ok(Page::new(items, page.next_cursor))
    }

    /// Partial update: only fields present in the request mutate the row
    /// (spec §4.1). Cron is re-validated and `next_run` recomputed
    /// whenever it's present; status changes are gated by the state
    /// machine.
    pub async fn update_job(&self, id: Uuid, request: UpdateJobRequest) -> Result<Job> {
        let mut job = self.get_job(id).await?;
        let now = Utc::now();

        if let Some(name) = request.name {
            job.name = name;
        }
        if let Some(description) = request.description {
            job.description = Some(description);
        }
        if let Some(cron_expression) = request.cron_expression {
            let cron = CronExpression::parse(&cron_expression)?;
            job.next_run = cron.next_run_after(now)?;
            job.cron_expression = cron_expression;
        }
        if let Some(status) = request.status {
            job.transition_to(status, now)?;
        }
        if let Some(metadata) = request.metadata {
            job.metadata = metadata;
        }
        if let Some(last_run) = request.last_run {
            job.last_run = Some(last_run);
        }
        job.updated_at = now;

        let row = self.repository.update(job.into_row()).await?;
        Job::try_from(row)
    }

    pub async fn delete_job(&self, id: Uuid) -> Result<()> {
        self.repository.delete(id).await
    }

    /// Fails `FAILED_PRECONDITION` if the job is already in a terminal
    /// status (spec §4.1).
    pub async fn cancel_job(&self, id: Uuid) -> Result<Job> {
        let mut job = self.get_job(id).await?;
        job.cancel(Utc::now())?;
        let row = self.repository.update(job.into_row()).await?;
        Job::try_from(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_size_clamps_per_spec_8() {
        assert_eq!(clamp_page_size(0, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE), 250);
        assert_eq!(clamp_page_size(-1, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE), 250);
        assert_eq!(clamp_page_size(1000, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE), 250);
        assert_eq!(clamp_page_size(10, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE), 10);
    }
}

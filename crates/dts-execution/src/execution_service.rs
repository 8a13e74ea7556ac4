//! `ExecutionService`: the read-only query surface over `Execution` rows
//! (spec §6.1).

use dts_core::error::{Error, Result};
use dts_core::pagination::{clamp_page_size, Page};
use dts_database::models::ExecutionRow;
use dts_database::repositories::ExecutionRepository;
use uuid::Uuid;

const DEFAULT_PAGE_SIZE: u32 = 250;
const MAX_PAGE_SIZE: u32 = 250;

pub struct ExecutionService {
    repository: ExecutionRepository,
}

impl ExecutionService {
    pub fn new(repository: ExecutionRepository) -> Self {
        Self { repository }
    }

    pub async fn get_execution(&self, id: Uuid) -> Result<ExecutionRow> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| Error::not_found("Execution", id.to_string()))
    }

    /// `page_size` clamps to `[1, 250]`, default 250 (spec §6.1/§8).
    pub async fn list_executions(
        &self,
        page_size: i64,
        job_id: Option<Uuid>,
        status: Option<&str>,
        last_id: Option<Uuid>,
    ) -> Result<Page<ExecutionRow>> {
        let page_size = clamp_page_size(page_size, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE);
        self.repository.list_page(last_id, job_id, status, page_size).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_size_clamps_per_spec_8() {
        assert_eq!(clamp_page_size(0, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE), 250);
        assert_eq!(clamp_page_size(-10, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE), 250);
        assert_eq!(clamp_page_size(10_000, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE), 250);
    }
}

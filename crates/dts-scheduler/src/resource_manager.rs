//! Optional resource-allocation gate (spec §3.4; SPEC_FULL §12 resolves
//! the §9 open question in favor of "optional gate used only by
//! `SchedulerService::schedule_job`", not the periodic-tick hot path).

use dts_core::error::Result;
use dts_database::models::ResourcesRow;
use dts_database::repositories::ResourcesRepository;

#[derive(Debug, Clone, Copy)]
pub struct ResourceRequest {
    pub cpu: i32,
    pub memory: i32,
    pub storage: i32,
}

pub struct ResourceManager {
    repository: ResourcesRepository,
}

impl ResourceManager {
    pub fn new(repository: ResourcesRepository) -> Self {
        Self { repository }
    }

    /// Subtracts from the global counter; fails `RESOURCE_EXHAUSTED` if
    /// insufficient (spec §3.4).
    pub async fn allocate(&self, request: ResourceRequest) -> Result<ResourcesRow> {
        self.repository
            .allocate(request.cpu, request.memory, request.storage)
            .await
    }

    pub async fn release(&self, request: ResourceRequest) -> Result<ResourcesRow> {
        self.repository
            .release(request.cpu, request.memory, request.storage)
            .await
    }
}

//! The job-service client contract consumed by `dts-scheduler` and
//! `dts-execution`. Modeled as a trait (rather than a concrete type) so
//! the scheduler and executor can be driven against a fake in tests and
//! so the real implementation can be swapped for an out-of-process RPC
//! client without touching call sites (spec §9: treat the job service as
//! an external collaborator reached through a client boundary).

use crate::job::{Job, JobStatus};
use crate::service::{JobService, UpdateJobRequest};
use async_trait::async_trait;
use dts_core::error::Result;
use uuid::Uuid;

#[cfg_attr(any(test, feature = "test-util"), mockall::automock)]
#[async_trait]
pub trait JobServiceClient: Send + Sync {
    async fn get_job(&self, id: Uuid) -> Result<Job>;
    async fn update_job(&self, id: Uuid, request: UpdateJobRequest) -> Result<Job>;
}

/// Adapts the in-process `JobService` to the client trait. `dts-server`
/// wires this in directly since the job service lives in the same
/// process as the scheduler and executor in this workspace.
pub struct InProcessJobServiceClient {
    service: JobService,
}

impl InProcessJobServiceClient {
    pub fn new(service: JobService) -> Self {
        Self { service }
    }
}

#[async_trait]
impl JobServiceClient for InProcessJobServiceClient {
    async fn get_job(&self, id: Uuid) -> Result<Job> {
        self.service.get_job(id).await
    }

    async fn update_job(&self, id: Uuid, request: UpdateJobRequest) -> Result<Job> {
        self.service.update_job(id, request).await
    }
}

/// Convenience constructor for the common "flip status" update used by
/// the scheduler and executor.
pub fn status_update(status: JobStatus) -> UpdateJobRequest {
    UpdateJobRequest {
        status: Some(status),
        ..Default::default()
    }
}

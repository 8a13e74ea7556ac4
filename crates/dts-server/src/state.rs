//! Shared application state handed to every route handler.

use dts_execution::ExecutionService;
use dts_jobs::JobService;
use dts_scheduler::SchedulerService;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub jobs: Arc<JobService>,
    pub scheduler: Arc<SchedulerService>,
    pub executions: Arc<ExecutionService>,
}

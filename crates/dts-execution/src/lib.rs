//! The execution task manager (spec §4.4), the `TaskExecutor` state
//! machine (spec §4.5), the `ExecutionService` query surface (spec
//! §6.1), and the stale-reservation sweep (SPEC_FULL §12).

pub mod execution_service;
pub mod executor;
pub mod stale_sweep;
pub mod task_manager;

pub use execution_service::ExecutionService;
pub use executor::{TaskExecutor, DEFAULT_MAX_RETRIES};
pub use stale_sweep::StaleSweep;
pub use task_manager::{Handler, Processor, TaskManager};

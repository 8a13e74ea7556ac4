//! The periodic scheduler loop (spec §4.3), the optional resource-
//! allocation gate (spec §3.4/§9), the background reconnect supervisor
//! for the job-service client (SPEC_FULL §12), and the thin
//! `SchedulerService` control surface (spec §6.1).

pub mod periodic_scheduler;
pub mod reconnect;
pub mod resource_manager;
pub mod scheduler_service;

pub use periodic_scheduler::{PeriodicScheduler, TickReport};
pub use reconnect::{spawn_reconnect, ReadinessGate};
pub use resource_manager::{ResourceManager, ResourceRequest};
pub use scheduler_service::{ScheduledJobView, SchedulerService};

//! The `Job` domain type, its status state machine, strict cron
//! validation, and the `JobService` RPC surface (spec §3.1/§4.1/§4.2).

pub mod client;
pub mod cron;
pub mod job;
pub mod service;

pub use client::{status_update, InProcessJobServiceClient, JobServiceClient};
pub use cron::CronExpression;
pub use job::{Job, JobStatus};
pub use service::{JobService, UpdateJobRequest};

#[cfg(any(test, feature = "test-util"))]
pub use client::MockJobServiceClient;

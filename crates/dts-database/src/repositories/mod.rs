pub mod executions;
pub mod jobs;
pub mod resources;
pub mod scheduled_jobs;

pub use executions::ExecutionRepository;
pub use jobs::JobRepository;
pub use resources::ResourcesRepository;
pub use scheduled_jobs::ScheduledJobRepository;

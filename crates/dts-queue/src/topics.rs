//! Topic and consumer-group constants (spec §4.4 / §4.7).

pub const PRIMARY_TOPIC: &str = "jobs";
pub const RETRY_TOPIC: &str = "jobs-retry";

pub const PRIMARY_GROUP: &str = "task_execution_group";
pub const RETRY_GROUP: &str = "task_retry_execution_group";

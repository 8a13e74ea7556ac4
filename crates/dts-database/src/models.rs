//! Row models for the persisted tables of §4.6.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use uuid::Uuid;

/// The `jobs` table row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct JobRow {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub cron_expression: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_run: Option<DateTime<Utc>>,
    pub next_run: DateTime<Utc>,
    pub metadata: serde_json::Value,
}

impl JobRow {
    pub fn metadata_map(&self) -> HashMap<String, String> {
        serde_json::from_value(self.metadata.clone()).unwrap_or_default()
    }
}

/// The `job_executions` table row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ExecutionRow {
    pub id: Uuid,
    pub job_id: Uuid,
    pub status: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub result: Option<String>,
    pub error: Option<String>,
}

/// The `scheduled_jobs` table row — an optional reservation record
/// capturing the resources held for an in-flight `ScheduledJob`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ScheduledJobRow {
    pub id: Uuid,
    pub job_data: Vec<u8>,
    pub cpu: i32,
    pub memory: i32,
    pub storage: i32,
    pub start_time: DateTime<Utc>,
}

/// The `available_resources` singleton row, keyed `'global'`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ResourcesRow {
    pub id: String,
    pub cpu: i32,
    pub memory: i32,
    pub storage: i32,
}

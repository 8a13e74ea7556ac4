//! The `Job` domain type and its status state machine (spec §3.1/§4.2).

use crate::cron::CronExpression;
use chrono::{DateTime, Utc};
use dts_core::error::{Error, Result};
use dts_database::models::JobRow;
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobStatus {
    Unspecified,
    Pending,
    Scheduled,
    Running,
    Completed,
    Failed,
    Cancelled,
    Retrying,
    Paused,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Unspecified => "UNSPECIFIED",
            JobStatus::Pending => "PENDING",
            JobStatus::Scheduled => "SCHEDULED",
            JobStatus::Running => "RUNNING",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Failed => "FAILED",
            JobStatus::Cancelled => "CANCELLED",
            JobStatus::Retrying => "RETRYING",
            JobStatus::Paused => "PAUSED",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        Ok(match s {
            "UNSPECIFIED" => JobStatus::Unspecified,
            "PENDING" => JobStatus::Pending,
            "SCHEDULED" => JobStatus::Scheduled,
            "RUNNING" => JobStatus::Running,
            "COMPLETED" => JobStatus::Completed,
            "FAILED" => JobStatus::Failed,
            "CANCELLED" => JobStatus::Cancelled,
            "RETRYING" => JobStatus::Retrying,
            "PAUSED" => JobStatus::Paused,
            other => return Err(Error::invalid_argument(format!("unknown job status {other}"))),
        })
    }

    /// Terminal states per the glossary: `COMPLETED`, `CANCELLED`;
    /// `FAILED` is terminal unless re-entered via `RETRYING`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Cancelled | JobStatus::Failed)
    }

    /// Validates a transition against the table in spec §4.2.
    pub fn validate_transition(from: JobStatus, to: JobStatus) -> Result<()> {
        use JobStatus::*;
        let allowed = matches!(
            (from, to),
            (Pending, Scheduled)
                | (Pending, Cancelled)
                | (Scheduled, Running)
                | (Scheduled, Cancelled)
                | (Scheduled, Pending)
                | (Running, Completed)
                | (Running, Failed)
                | (Running, Cancelled)
                | (Failed, Retrying)
                | (Failed, Cancelled)
                | (Paused, Scheduled)
                | (Paused, Cancelled)
                | (Retrying, Running)
                | (Retrying, Failed)
                | (Retrying, Cancelled)
        );

        if allowed {
            Ok(())
        } else {
            Err(Error::invalid_argument(format!(
                "illegal status transition {} -> {}",
                from.as_str(),
                to.as_str()
            )))
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct Job {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub cron_expression: String,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_run: Option<DateTime<Utc>>,
    pub next_run: DateTime<Utc>,
    pub metadata: HashMap<String, String>,
}

impl Job {
    /// Builds a new job for `CreateJob`: fresh UUIDv1, `PENDING` status,
    /// `created_at == updated_at == now`, `next_run` computed from the
    /// validated cron expression (spec §4.1).
    pub fn create(
        name: String,
        description: Option<String>,
        cron_expression: String,
        metadata: HashMap<String, String>,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let cron = CronExpression::parse(&cron_expression)?;
        let next_run = cron.next_run_after(now)?;

        Ok(Self {
            id: new_time_ordered_id(),
            name,
            description,
            cron_expression,
            status: JobStatus::Pending,
            created_at: now,
            updated_at: now,
            last_run: None,
            next_run,
            metadata,
        })
    }

    pub fn transition_to(&mut self, to: JobStatus, now: DateTime<Utc>) -> Result<()> {
        JobStatus::validate_transition(self.status, to)?;
        self.status = to;
        self.updated_at = now;
        Ok(())
    }

    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<()> {
        if self.status.is_terminal() {
            return Err(Error::failed_precondition(format!(
                "cannot cancel job in terminal status {}",
                self.status
            )));
        }
        self.transition_to(JobStatus::Cancelled, now)
    }

    pub fn into_row(self) -> JobRow {
        JobRow {
            id: self.id,
            name: self.name,
            description: self.description,
            cron_expression: self.cron_expression,
            status: self.status.as_str().to_string(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            last_run: self.last_run,
            next_run: self.next_run,
            metadata: serde_json::to_value(&self.metadata).unwrap_or_default(),
        }
    }
}

impl TryFrom<JobRow> for Job {
    type Error = Error;

    fn try_from(row: JobRow) -> Result<Self> {
        Ok(Self {
            id: row.id,
            name: row.name,
            description: row.description,
            cron_expression: row.cron_expression,
            status: JobStatus::parse(&row.status)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
            last_run: row.last_run,
            next_run: row.next_run,
            metadata: row.metadata_map(),
        })
    }
}

fn new_time_ordered_id() -> Uuid {
    Uuid::now_v1(&[0, 1, 2, 3, 4, 5])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn create_computes_pending_status_and_next_run() {
        let now = Utc.with_ymd_and_hms(2026, 7, 27, 12, 3, 17).unwrap();
        let job = Job::create(
            "x".to_string(),
            None,
            "*/5 * * * *".to_string(),
            HashMap::new(),
            now,
        )
        .unwrap();

        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.next_run, Utc.with_ymd_and_hms(2026, 7, 27, 12, 5, 0).unwrap());
        assert_eq!(job.created_at, job.updated_at);
    }

    #[test]
    fn state_machine_rejects_unlisted_edges() {
        assert!(JobStatus::validate_transition(JobStatus::Pending, JobStatus::Running).is_err());
        assert!(JobStatus::validate_transition(JobStatus::Completed, JobStatus::Running).is_err());
        assert!(JobStatus::validate_transition(JobStatus::Pending, JobStatus::Scheduled).is_ok());
        assert!(JobStatus::validate_transition(JobStatus::Scheduled, JobStatus::Pending).is_ok());
    }

    #[test]
    fn cancel_terminal_job_fails_precondition() {
        let now = Utc::now();
        let mut job = Job::create("x".to_string(), None, "0 * * * *".to_string(), HashMap::new(), now).unwrap();
        job.transition_to(JobStatus::Scheduled, now).unwrap();
        job.transition_to(JobStatus::Running, now).unwrap();
        job.transition_to(JobStatus::Completed, now).unwrap();

        let err = job.cancel(now).unwrap_err();
        assert_eq!(err.status_code(), "FAILED_PRECONDITION");
    }
}

//! The `TaskExecutor` state machine (spec §4.5): creates an `Execution`
//! row when a task is dequeued, drives it to a terminal state, reports
//! completion to the job service, and re-enqueues failures to the retry
//! topic bounded by `max_retries`.

use chrono::Utc;
use dts_core::error::{Error, Result};
use dts_database::models::ExecutionRow;
use dts_database::repositories::ExecutionRepository;
use dts_jobs::{status_update, JobServiceClient, JobStatus};
use dts_queue::ScheduledJob;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Default bound on the retry topic (spec §4.5/§8: messages with
/// `retry_count >= 3` are dropped by the retry consumer).
pub const DEFAULT_MAX_RETRIES: u32 = 3;
const RETRY_PRODUCE_TIMEOUT: Duration = Duration::from_secs(10);

pub struct TaskExecutor {
    executions: ExecutionRepository,
    job_service: Arc<dyn JobServiceClient>,
    producer: Arc<dyn dts_queue::Producer>,
    retry_topic: String,
    max_retries: u32,
}

impl TaskExecutor {
    pub fn new(
        executions: ExecutionRepository,
        job_service: Arc<dyn JobServiceClient>,
        producer: Arc<dyn dts_queue::Producer>,
        retry_topic: String,
    ) -> Self {
        Self {
            executions,
            job_service,
            producer,
            retry_topic,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Handles a delivery from the primary topic: deserialize, attempt
    /// the work, and on failure push onto the retry topic with
    /// `retry_count = 1`. Malformed payloads — including an empty
    /// `JobID`, rejected by `ScheduledJob::from_json` — are logged and
    /// dropped rather than retried (spec §4.5 step 1 is
    /// `INVALID_ARGUMENT`, not retryable).
    pub async fn handle_primary(&self, payload: &[u8]) -> Result<()> {
        let scheduled = match ScheduledJob::from_json(payload) {
            Ok(job) => job,
            Err(e) => {
                tracing::warn!(error = %e, "dropping malformed ScheduledJob on primary topic");
                return Ok(());
            }
        };

        self.run_and_recover(scheduled).await
    }

    /// Handles a delivery from the retry topic: short-circuits when
    /// `retry_count >= max_retries`, logging and returning success so the
    /// message is dropped rather than re-enqueued (spec §4.5).
    pub async fn handle_retry(&self, payload: &[u8]) -> Result<()> {
        let scheduled = match ScheduledJob::from_json(payload) {
            Ok(job) => job,
            Err(e) => {
                tracing::warn!(error = %e, "dropping malformed ScheduledJob on retry topic");
                return Ok(());
            }
        };

        if scheduled.retry_count >= self.max_retries {
            tracing::warn!(
                job_id = %scheduled.job_id,
                idempotency_key = %scheduled.idempotency_key,
                retry_count = scheduled.retry_count,
                "retry count exhausted, dropping message"
            );
            return Ok(());
        }

        self.run_and_recover(scheduled).await
    }

    /// Runs the work and, on failure, re-enqueues to the retry topic
    /// rather than propagating the error — from the consumer loop's
    /// perspective the record has been handled and its offset commits.
    async fn run_and_recover(&self, scheduled: ScheduledJob) -> Result<()> {
        match self.attempt(&scheduled).await {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::warn!(
                    job_id = %scheduled.job_id,
                    idempotency_key = %scheduled.idempotency_key,
                    error = %e,
                    "execution failed, re-enqueuing to retry topic"
                );
                self.enqueue_retry(&scheduled).await
            }
        }
    }

    /// Steps 2-5 of spec §4.5: parse the job id, create a `RUNNING`
    /// execution, invoke the placeholder work, and on success mark the
    /// execution `COMPLETED` and report back to the job service.
    async fn attempt(&self, scheduled: &ScheduledJob) -> Result<()> {
        let job_id = Uuid::parse_str(&scheduled.job_id)
            .map_err(|e| Error::invalid_argument(format!("ScheduledJob.JobID is not a UUID: {e}")))?;

        let execution = ExecutionRow {
            id: Uuid::now_v1(&[0, 1, 2, 3, 4, 5]),
            job_id,
            status: "RUNNING".to_string(),
            start_time: scheduled.start_time,
            end_time: None,
            result: None,
            error: None,
        };
        let execution = self.executions.create(execution).await?;

        self.run_task(job_id).await?;

        let end_time = Utc::now();
        self.executions
            .complete(execution.id, "COMPLETED", end_time, Some("ok"), None)
            .await?;

        self.job_service
            .update_job(
                job_id,
                dts_jobs::UpdateJobRequest {
                    last_run: Some(end_time),
                    ..status_update(JobStatus::Completed)
                },
            )
            .await?;

        Ok(())
    }

    /// Placeholder for the real unit of work (spec §9 open question: the
    /// reference implementation carries a commented-out sleep here; what
    /// a production executor should dispatch to is unspecified). A no-op
    /// that always succeeds.
    async fn run_task(&self, job_id: Uuid) -> Result<()> {
        tracing::debug!(job_id = %job_id, "executing task (no-op placeholder)");
        Ok(())
    }

    async fn enqueue_retry(&self, scheduled: &ScheduledJob) -> Result<()> {
        let retried = scheduled.retried(Utc::now());
        let bytes = retried.to_json()?;
        let key = retried.idempotency_key.to_string();
        self.producer
            .produce(&self.retry_topic, &key, bytes, RETRY_PRODUCE_TIMEOUT)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dts_jobs::MockJobServiceClient;
    use dts_queue::producer::fakes::RecordingProducer;
    use sqlx::postgres::PgPoolOptions;

    fn unreachable_pool() -> sqlx::PgPool {
        PgPoolOptions::new()
            .max_connections(1)
            .connect_lazy("postgres://localhost/unused")
            .expect("lazy pool construction does not connect")
    }

    #[tokio::test]
    async fn retry_exhaustion_drops_without_executing() {
        let mock = MockJobServiceClient::new();
        let producer = Arc::new(RecordingProducer::default());
        let executor = TaskExecutor::new(
            ExecutionRepository::new(unreachable_pool()),
            Arc::new(mock),
            producer.clone(),
            "jobs-retry".to_string(),
        );

        let job_id = Uuid::now_v1(&[0; 6]).to_string();
        let mut scheduled = ScheduledJob::first_attempt(job_id, Utc::now());
        scheduled.retry_count = 3;
        let payload = scheduled.to_json().unwrap();

        let result = executor.handle_retry(&payload).await;
        assert!(result.is_ok());
        assert!(producer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_payload_is_dropped_not_retried() {
        let mock = MockJobServiceClient::new();
        let producer = Arc::new(RecordingProducer::default());
        let executor = TaskExecutor::new(
            ExecutionRepository::new(unreachable_pool()),
            Arc::new(mock),
            producer.clone(),
            "jobs-retry".to_string(),
        );

        let result = executor.handle_primary(b"not json").await;
        assert!(result.is_ok());
        assert!(producer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_job_id_is_rejected_as_malformed() {
        let mock = MockJobServiceClient::new();
        let producer = Arc::new(RecordingProducer::default());
        let executor = TaskExecutor::new(
            ExecutionRepository::new(unreachable_pool()),
            Arc::new(mock),
            producer.clone(),
            "jobs-retry".to_string(),
        );

        let payload = serde_json::json!({
            "IdempotencyKey": Uuid::new_v4(),
            "JobID": "",
            "StartTime": Utc::now(),
            "RetryCount": 0,
        });
        let bytes = serde_json::to_vec(&payload).unwrap();

        let result = executor.handle_primary(&bytes).await;
        assert!(result.is_ok());
        assert!(producer.sent.lock().unwrap().is_empty());
    }
}

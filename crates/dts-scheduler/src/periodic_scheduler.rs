//! The periodic scheduler loop (spec §4.3): scans for due jobs, flips
//! them to `SCHEDULED`, and enqueues a `ScheduledJob`, compensating back
//! to `PENDING` on enqueue failure.

use crate::reconnect::ReadinessGate;
use chrono::{DateTime, Duration as ChronoDuration, Timelike, Utc};
use dts_database::repositories::JobRepository;
use dts_jobs::{status_update, JobServiceClient, JobStatus};
use dts_queue::{Producer, ScheduledJob};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Per-cycle counters reported by the tick (spec §4.3 step 4).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub found: usize,
    pub scheduled: usize,
    pub elapsed_ms: u128,
}

pub struct PeriodicScheduler {
    jobs: JobRepository,
    job_service: Arc<dyn JobServiceClient>,
    producer: Arc<dyn Producer>,
    task_topic: String,
    readiness: Arc<ReadinessGate>,
    tick_interval: Duration,
}

impl PeriodicScheduler {
    pub fn new(
        jobs: JobRepository,
        job_service: Arc<dyn JobServiceClient>,
        producer: Arc<dyn Producer>,
        task_topic: String,
        readiness: Arc<ReadinessGate>,
    ) -> Self {
        Self {
            jobs,
            job_service,
            producer,
            task_topic,
            readiness,
            tick_interval: Duration::from_secs(60),
        }
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Runs until `cancel` is triggered. Any single-job error is logged
    /// and the tick continues (spec §4.3 failure semantics).
    pub async fn run(&self, cancel: CancellationToken) {
        tracing::info!("periodic scheduler started");

        while !cancel.is_cancelled() {
            if !self.readiness.is_ready() {
                tracing::warn!("job service not reachable, skipping tick");
            } else {
                let report = self.tick(Utc::now()).await;
                tracing::info!(
                    found = report.found,
                    scheduled = report.scheduled,
                    elapsed_ms = report.elapsed_ms,
                    "scheduler tick complete"
                );
            }

            tokio::select! {
                _ = tokio::time::sleep(self.tick_interval) => {}
                _ = cancel.cancelled() => break,
            }
        }

        tracing::info!("periodic scheduler stopped");
    }

    /// A single tick, exposed separately for tests and for callers that
    /// want to drive it manually rather than via `run`'s loop.
    pub async fn tick(&self, now: DateTime<Utc>) -> TickReport {
        let started = std::time::Instant::now();
        let t = truncate_to_minute(now);

        let due = match self.jobs.find_due(t).await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::error!(error = %e, "failed to query due jobs");
                return TickReport {
                    elapsed_ms: started.elapsed().as_millis(),
                    ..Default::default()
                };
            }
        };

        let mut scheduled = 0;
        for row in &due {
            if self.schedule_one(row.id, now).await {
                scheduled += 1;
            }
        }

        TickReport {
            found: due.len(),
            scheduled,
            elapsed_ms: started.elapsed().as_millis(),
        }
    }

    /// Steps 3a-3d of spec §4.3 for a single job.
    async fn schedule_one(&self, job_id: uuid::Uuid, now: DateTime<Utc>) -> bool {
        if let Err(e) = self
            .job_service
            .update_job(job_id, status_update(JobStatus::Scheduled))
            .await
        {
            tracing::warn!(job_id = %job_id, error = %e, "failed to flip job to SCHEDULED, skipping");
            return false;
        }

        let message = ScheduledJob::first_attempt(job_id.to_string(), now);
        let bytes = match message.to_json() {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(job_id = %job_id, error = %e, "failed to serialize ScheduledJob");
                self.compensate(job_id).await;
                return false;
            }
        };

        let key = message.idempotency_key.to_string();
        match self
            .producer
            .produce(&self.task_topic, &key, bytes, Duration::from_secs(10))
            .await
        {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(job_id = %job_id, error = %e, "enqueue failed, compensating");
                self.compensate(job_id).await;
                false
            }
        }
    }

    async fn compensate(&self, job_id: uuid::Uuid) {
        if let Err(e) = self
            .job_service
            .update_job(job_id, status_update(JobStatus::Pending))
            .await
        {
            tracing::error!(job_id = %job_id, error = %e, "compensation UpdateJob(PENDING) also failed");
        }
    }
}

fn truncate_to_minute(t: DateTime<Utc>) -> DateTime<Utc> {
    t - ChronoDuration::seconds(t.second() as i64)
        - ChronoDuration::nanoseconds(t.timestamp_subsec_nanos() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dts_jobs::MockJobServiceClient;
    use dts_queue::producer::fakes::RecordingProducer;

    fn ready_gate() -> Arc<ReadinessGate> {
        let gate = ReadinessGate::new();
        gate
    }

    #[test]
    fn truncate_drops_seconds_and_subseconds() {
        use chrono::TimeZone;
        let t = Utc.with_ymd_and_hms(2026, 7, 27, 12, 5, 42).unwrap();
        let truncated = truncate_to_minute(t);
        assert_eq!(truncated.second(), 0);
        assert_eq!(truncated.minute(), 5);
    }

    #[tokio::test]
    async fn schedule_one_compensates_on_enqueue_failure() {
        let mut mock = MockJobServiceClient::new();
        mock.expect_update_job()
            .times(2) // SCHEDULED then the compensating PENDING
            .returning(|id, req| {
                Box::pin(async move {
                    let mut job = dts_jobs::Job::create(
                        "x".into(),
                        None,
                        "* * * * *".into(),
                        Default::default(),
                        Utc::now(),
                    )
                    .unwrap();
                    job.id = id;
                    if let Some(status) = req.status {
                        job.status = status;
                    }
                    Ok(job)
                })
            });

        let producer = Arc::new(RecordingProducer::default());
        producer.fail_next_call();

        let scheduler = PeriodicScheduler::new(
            // jobs repository isn't exercised by schedule_one directly
            JobRepository::new(unreachable_pool()),
            Arc::new(mock),
            producer.clone(),
            "jobs".to_string(),
            ready_gate(),
        );

        let ok = scheduler.schedule_one(uuid::Uuid::now_v1(&[0; 6]), Utc::now()).await;
        assert!(!ok);
        assert!(producer.sent.lock().unwrap().is_empty());
    }

    /// A `PgPool` that's never queried in this test — `schedule_one`
    /// doesn't touch `self.jobs`, only `tick` does.
    fn unreachable_pool() -> sqlx::PgPool {
        sqlx::postgres::PgPoolOptions::new()
            .max_connections(1)
            .connect_lazy("postgres://localhost/unused")
            .expect("lazy pool construction does not connect")
    }
}

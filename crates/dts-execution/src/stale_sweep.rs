//! Stale-reservation sweep (SPEC_FULL §12): a periodic task that reverts
//! a `RUNNING` execution whose owning consumer vanished mid-processing
//! back to a terminal state, so the job doesn't stay orphaned forever.
//!
//! The execution's row carries no `idempotency_key` or `retry_count` of
//! its own (spec §3.2 tracks only status/timestamps), so the sweep
//! cannot re-synthesize a `ScheduledJob` to push back onto the retry
//! topic the way the executor's own failure path does. It marks the
//! execution `FAILED` and the job `FAILED`, leaving any further retry to
//! an operator or a fresh `CreateJob`/`UpdateJob` call — see DESIGN.md.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use dts_core::error::Result;
use dts_database::repositories::ExecutionRepository;
use dts_jobs::{status_update, JobServiceClient};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const DEFAULT_STALE_AFTER: ChronoDuration = ChronoDuration::minutes(15);
const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

pub struct StaleSweep {
    executions: ExecutionRepository,
    job_service: Arc<dyn JobServiceClient>,
    stale_after: ChronoDuration,
    sweep_interval: Duration,
}

impl StaleSweep {
    pub fn new(executions: ExecutionRepository, job_service: Arc<dyn JobServiceClient>) -> Self {
        Self {
            executions,
            job_service,
            stale_after: DEFAULT_STALE_AFTER,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }

    pub fn with_stale_after(mut self, stale_after: ChronoDuration) -> Self {
        self.stale_after = stale_after;
        self
    }

    pub async fn run(&self, cancel: CancellationToken) {
        tracing::info!("stale-execution sweep started");

        while !cancel.is_cancelled() {
            let swept = self.sweep(Utc::now()).await;
            if swept > 0 {
                tracing::warn!(swept, "reverted stale RUNNING executions");
            }

            tokio::select! {
                _ = tokio::time::sleep(self.sweep_interval) => {}
                _ = cancel.cancelled() => break,
            }
        }

        tracing::info!("stale-execution sweep stopped");
    }

    /// Exposed separately so tests can drive a single pass deterministically.
    pub async fn sweep(&self, now: DateTime<Utc>) -> usize {
        let cutoff = now - self.stale_after;
        let stale = match self.executions.find_stale_running(cutoff).await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::error!(error = %e, "failed to query stale executions");
                return 0;
            }
        };

        let mut swept = 0;
        for execution in stale {
            let result = self
                .executions
                .complete(
                    execution.id,
                    "FAILED",
                    now,
                    None,
                    Some("stale: no progress observed, consumer presumed dead"),
                )
                .await;

            if let Err(e) = result {
                tracing::error!(execution_id = %execution.id, error = %e, "failed to mark stale execution FAILED");
                continue;
            }

            if let Err(e) = self
                .job_service
                .update_job(execution.job_id, status_update(dts_jobs::JobStatus::Failed))
                .await
            {
                tracing::error!(job_id = %execution.job_id, error = %e, "failed to mark job FAILED after stale sweep");
                continue;
            }

            swept += 1;
        }

        swept
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_stale_window_is_fifteen_minutes() {
        assert_eq!(DEFAULT_STALE_AFTER, ChronoDuration::minutes(15));
    }
}

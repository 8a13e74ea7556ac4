//! The `ScheduledJob` wire envelope (spec §3.3 / §6.2).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JSON field names are fixed by the wire contract:
/// `{"IdempotencyKey","JobID","StartTime","RetryCount"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledJob {
    #[serde(rename = "IdempotencyKey")]
    pub idempotency_key: Uuid,
    #[serde(rename = "JobID")]
    pub job_id: String,
    #[serde(rename = "StartTime")]
    pub start_time: DateTime<Utc>,
    #[serde(rename = "RetryCount")]
    pub retry_count: u32,
}

impl ScheduledJob {
    pub fn first_attempt(job_id: impl Into<String>, start_time: DateTime<Utc>) -> Self {
        Self {
            idempotency_key: Uuid::new_v4(),
            job_id: job_id.into(),
            start_time,
            retry_count: 0,
        }
    }

    pub fn to_json(&self) -> dts_core::error::Result<Vec<u8>> {
        serde_json::to_vec(self)
            .map_err(|e| dts_core::error::Error::Serialization { message: e.to_string() })
    }

    /// Deserializes and rejects a malformed or empty `job_id` (spec §4.5
    /// step 1: empty `job_id` is malformed).
    pub fn from_json(bytes: &[u8]) -> dts_core::error::Result<Self> {
        let job: Self = serde_json::from_slice(bytes)
            .map_err(|e| dts_core::error::Error::invalid_argument(format!("malformed ScheduledJob: {e}")))?;

        if job.job_id.trim().is_empty() {
            return Err(dts_core::error::Error::invalid_argument(
                "ScheduledJob.JobID must not be empty",
            ));
        }
        Ok(job)
    }

    /// Returns a copy with `retry_count` incremented and a new start time,
    /// for re-enqueuing onto the retry topic (spec §4.5's retry path).
    pub fn retried(&self, at: DateTime<Utc>) -> Self {
        Self {
            idempotency_key: self.idempotency_key,
            job_id: self.job_id.clone(),
            start_time: at,
            retry_count: self.retry_count + 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_round_trip_preserves_field_names() {
        let job = ScheduledJob::first_attempt("11111111-1111-1111-1111-111111111111", Utc::now());
        let bytes = job.to_json().unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.contains("\"IdempotencyKey\""));
        assert!(text.contains("\"JobID\""));
        assert!(text.contains("\"StartTime\""));
        assert!(text.contains("\"RetryCount\""));

        let round_tripped = ScheduledJob::from_json(&bytes).unwrap();
        assert_eq!(round_tripped, job);
    }

    #[test]
    fn empty_job_id_is_rejected() {
        let payload = serde_json::json!({
            "IdempotencyKey": Uuid::new_v4(),
            "JobID": "",
            "StartTime": Utc::now(),
            "RetryCount": 0,
        });
        let bytes = serde_json::to_vec(&payload).unwrap();
        let err = ScheduledJob::from_json(&bytes).unwrap_err();
        assert_eq!(err.status_code(), "INVALID_ARGUMENT");
    }

    #[test]
    fn retried_increments_count_and_keeps_idempotency_key() {
        let original = ScheduledJob::first_attempt("job-1", Utc::now());
        let retried = original.retried(Utc::now());
        assert_eq!(retried.retry_count, 1);
        assert_eq!(retried.idempotency_key, original.idempotency_key);
    }
}

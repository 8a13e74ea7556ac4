//! `SchedulerService`: the thin control surface over the internal
//! periodic-scheduler loop (spec §6.1). Unlike the tick path, manual
//! `ScheduleJob` calls run the optional resource-allocation gate of
//! SPEC_FULL §12 — resolving spec §9's open question in favor of
//! "optional gate used only here".

use crate::resource_manager::{ResourceManager, ResourceRequest};
use chrono::{DateTime, Utc};
use dts_core::error::{Error, Result};
use dts_core::pagination::{clamp_page_size, Page};
use dts_database::models::ScheduledJobRow;
use dts_database::repositories::ScheduledJobRepository;
use dts_queue::{Producer, ScheduledJob};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

const DEFAULT_PAGE_SIZE: u32 = 100;
const MAX_PAGE_SIZE: u32 = 100;
const PRODUCE_TIMEOUT: Duration = Duration::from_secs(10);

/// A reservation row plus the decoded `ScheduledJob` envelope it holds,
/// returned by `GetScheduledJob`/`ListScheduledJobs`.
#[derive(Debug, Clone)]
pub struct ScheduledJobView {
    pub id: Uuid,
    pub envelope: ScheduledJob,
    pub cpu: i32,
    pub memory: i32,
    pub storage: i32,
    pub start_time: DateTime<Utc>,
}

impl TryFrom<ScheduledJobRow> for ScheduledJobView {
    type Error = Error;

    fn try_from(row: ScheduledJobRow) -> Result<Self> {
        let envelope = ScheduledJob::from_json(&row.job_data)?;
        Ok(Self {
            id: row.id,
            envelope,
            cpu: row.cpu,
            memory: row.memory,
            storage: row.storage,
            start_time: row.start_time,
        })
    }
}

pub struct SchedulerService {
    reservations: ScheduledJobRepository,
    resources: ResourceManager,
    producer: Arc<dyn Producer>,
    task_topic: String,
}

impl SchedulerService {
    pub fn new(
        reservations: ScheduledJobRepository,
        resources: ResourceManager,
        producer: Arc<dyn Producer>,
        task_topic: String,
    ) -> Self {
        Self {
            reservations,
            resources,
            producer,
            task_topic,
        }
    }

    /// Allocates `request`'s resources, produces a fresh `ScheduledJob`
    /// envelope to the task topic, and persists a reservation row so the
    /// held resources can be released by a later `CancelJob`. Fails
    /// `RESOURCE_EXHAUSTED` without touching the queue if allocation
    /// fails (spec §3.4).
    pub async fn schedule_job(&self, job_id: Uuid, request: ResourceRequest) -> Result<ScheduledJobView> {
        self.resources.allocate(request).await?;

        let now = Utc::now();
        let envelope = ScheduledJob::first_attempt(job_id.to_string(), now);
        let job_data = match envelope.to_json() {
            Ok(bytes) => bytes,
            Err(e) => {
                self.resources.release(request).await.ok();
                return Err(e);
            }
        };

        let key = envelope.idempotency_key.to_string();
        if let Err(e) = self
            .producer
            .produce(&self.task_topic, &key, job_data.clone(), PRODUCE_TIMEOUT)
            .await
        {
            self.resources.release(request).await.ok();
            return Err(e);
        }

        let row = ScheduledJobRow {
            id: envelope.idempotency_key,
            job_data,
            cpu: request.cpu,
            memory: request.memory,
            storage: request.storage,
            start_time: now,
        };
        let stored = self.reservations.create(row).await?;
        ScheduledJobView::try_from(stored)
    }

    /// Releases the reservation's held resources and deletes its row.
    pub async fn cancel_job(&self, reservation_id: Uuid) -> Result<()> {
        let row = self
            .reservations
            .find_by_id(reservation_id)
            .await?
            .ok_or_else(|| Error::not_found("ScheduledJob", reservation_id.to_string()))?;

        self.resources
            .release(ResourceRequest {
                cpu: row.cpu,
                memory: row.memory,
                storage: row.storage,
            })
            .await?;

        self.reservations.delete(reservation_id).await
    }

    pub async fn get_scheduled_job(&self, reservation_id: Uuid) -> Result<ScheduledJobView> {
        let row = self
            .reservations
            .find_by_id(reservation_id)
            .await?
            .ok_or_else(|| Error::not_found("ScheduledJob", reservation_id.to_string()))?;
        ScheduledJobView::try_from(row)
    }

    /// `page_size` clamps to `[1, 100]`, default 100 (spec §6.1).
    pub async fn list_scheduled_jobs(&self, page_size: i64, last_id: Option<Uuid>) -> Result<Page<ScheduledJobView>> {
        let page_size = clamp_page_size(page_size, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE);
        let page = self.reservations.list_page(last_id, page_size).await?;

        let items = page
            .items
            .into_iter()
            .map(ScheduledJobView::try_from)
            .collect::<Result<Vec<_>>>()?;

        Ok(Page::new(items, page.next_cursor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_size_clamps_to_100_per_spec_6_1() {
        assert_eq!(clamp_page_size(0, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE), 100);
        assert_eq!(clamp_page_size(1000, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE), 100);
        assert_eq!(clamp_page_size(25, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE), 25);
    }
}

//! HTTP surface for the thin `SchedulerService` control surface (spec
//! §6.1): `ScheduleJob, CancelJob, GetScheduledJob, ListScheduledJobs`.

use crate::error::ApiResult;
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::Json;
use dts_scheduler::ResourceRequest;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct ScheduledJobResponse {
    pub id: Uuid,
    pub job_id: String,
    pub idempotency_key: Uuid,
    pub retry_count: u32,
    pub start_time: chrono::DateTime<chrono::Utc>,
    pub cpu: i32,
    pub memory: i32,
    pub storage: i32,
}

impl From<dts_scheduler::ScheduledJobView> for ScheduledJobResponse {
    fn from(view: dts_scheduler::ScheduledJobView) -> Self {
        Self {
            id: view.id,
            job_id: view.envelope.job_id,
            idempotency_key: view.envelope.idempotency_key,
            retry_count: view.envelope.retry_count,
            start_time: view.start_time,
            cpu: view.cpu,
            memory: view.memory,
            storage: view.storage,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ScheduleJobRequest {
    pub job_id: Uuid,
    #[serde(default)]
    pub cpu: i32,
    #[serde(default)]
    pub memory: i32,
    #[serde(default)]
    pub storage: i32,
}

pub async fn schedule_job(
    State(state): State<AppState>,
    Json(request): Json<ScheduleJobRequest>,
) -> ApiResult<Json<ScheduledJobResponse>> {
    let view = state
        .scheduler
        .schedule_job(
            request.job_id,
            ResourceRequest {
                cpu: request.cpu,
                memory: request.memory,
                storage: request.storage,
            },
        )
        .await?;
    Ok(Json(view.into()))
}

#[derive(Debug, Serialize)]
pub struct CancelScheduledJobResponse {
    pub success: bool,
}

pub async fn cancel_scheduled_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<CancelScheduledJobResponse>> {
    state.scheduler.cancel_job(id).await?;
    Ok(Json(CancelScheduledJobResponse { success: true }))
}

pub async fn get_scheduled_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ScheduledJobResponse>> {
    let view = state.scheduler.get_scheduled_job(id).await?;
    Ok(Json(view.into()))
}

#[derive(Debug, Deserialize)]
pub struct ListScheduledJobsQuery {
    #[serde(default)]
    pub page_size: i64,
    pub last_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct ListScheduledJobsResponse {
    pub scheduled_jobs: Vec<ScheduledJobResponse>,
    pub next_page: Option<Uuid>,
}

pub async fn list_scheduled_jobs(
    State(state): State<AppState>,
    Query(query): Query<ListScheduledJobsQuery>,
) -> ApiResult<Json<ListScheduledJobsResponse>> {
    let page = state.scheduler.list_scheduled_jobs(query.page_size, query.last_id).await?;
    Ok(Json(ListScheduledJobsResponse {
        scheduled_jobs: page.items.into_iter().map(ScheduledJobResponse::from).collect(),
        next_page: page.next_cursor,
    }))
}

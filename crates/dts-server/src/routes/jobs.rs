//! HTTP surface for `JobService` (spec §6.1): `CreateJob, GetJob,
//! ListJobs, UpdateJob, DeleteJob, CancelJob`.

use crate::error::ApiResult;
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::Json;
use dts_jobs::{Job, JobStatus, UpdateJobRequest};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct JobResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub cron_expression: String,
    pub status: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    pub last_run: Option<chrono::DateTime<chrono::Utc>>,
    pub next_run: chrono::DateTime<chrono::Utc>,
    pub metadata: HashMap<String, String>,
}

impl From<Job> for JobResponse {
    fn from(job: Job) -> Self {
        Self {
            id: job.id,
            name: job.name,
            description: job.description,
            cron_expression: job.cron_expression,
            status: job.status.as_str().to_string(),
            created_at: job.created_at,
            updated_at: job.updated_at,
            last_run: job.last_run,
            next_run: job.next_run,
            metadata: job.metadata,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    pub name: String,
    pub description: Option<String>,
    pub cron_expression: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

pub async fn create_job(
    State(state): State<AppState>,
    Json(request): Json<CreateJobRequest>,
) -> ApiResult<Json<JobResponse>> {
    let job = state
        .jobs
        .create_job(request.name, request.description, request.cron_expression, request.metadata)
        .await?;
    Ok(Json(job.into()))
}

pub async fn get_job(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<JobResponse>> {
    let job = state.jobs.get_job(id).await?;
    Ok(Json(job.into()))
}

#[derive(Debug, Deserialize)]
pub struct ListJobsQuery {
    #[serde(default)]
    pub page_size: i64,
    pub status: Option<String>,
    pub last_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct ListJobsResponse {
    pub jobs: Vec<JobResponse>,
    pub total: usize,
    pub next_page: Option<Uuid>,
}

pub async fn list_jobs(
    State(state): State<AppState>,
    Query(query): Query<ListJobsQuery>,
) -> ApiResult<Json<ListJobsResponse>> {
    let page = state
        .jobs
        .list_jobs(query.page_size, query.status.as_deref(), query.last_id)
        .await?;

    Ok(Json(ListJobsResponse {
        total: page.items.len(),
        jobs: page.items.into_iter().map(JobResponse::from).collect(),
        next_page: page.next_cursor,
    }))
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateJobBody {
    pub name: Option<String>,
    pub description: Option<String>,
    pub cron_expression: Option<String>,
    pub status: Option<String>,
    pub metadata: Option<HashMap<String, String>>,
    pub last_run: Option<chrono::DateTime<chrono::Utc>>,
}

pub async fn update_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateJobBody>,
) -> ApiResult<Json<JobResponse>> {
    let status = body.status.map(|s| JobStatus::parse(&s)).transpose()?;

    let request = UpdateJobRequest {
        name: body.name,
        description: body.description,
        cron_expression: body.cron_expression,
        status,
        metadata: body.metadata,
        last_run: body.last_run,
    };

    let job = state.jobs.update_job(id, request).await?;
    Ok(Json(job.into()))
}

#[derive(Debug, Serialize)]
pub struct DeleteJobResponse {
    pub success: bool,
}

pub async fn delete_job(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<DeleteJobResponse>> {
    state.jobs.delete_job(id).await?;
    Ok(Json(DeleteJobResponse { success: true }))
}

#[derive(Debug, Serialize)]
pub struct CancelJobResponse {
    pub success: bool,
    pub message: String,
}

pub async fn cancel_job(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<CancelJobResponse>> {
    state.jobs.cancel_job(id).await?;
    Ok(Json(CancelJobResponse {
        success: true,
        message: "job cancelled".to_string(),
    }))
}

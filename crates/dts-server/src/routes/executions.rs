//! HTTP surface for `ExecutionService` (spec §6.1): `GetExecution,
//! ListExecutions`.

use crate::error::ApiResult;
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::Json;
use dts_database::models::ExecutionRow;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct ExecutionResponse {
    pub id: Uuid,
    pub job_id: Uuid,
    pub status: String,
    pub start_time: chrono::DateTime<chrono::Utc>,
    pub end_time: Option<chrono::DateTime<chrono::Utc>>,
    pub result: Option<String>,
    pub error: Option<String>,
}

impl From<ExecutionRow> for ExecutionResponse {
    fn from(row: ExecutionRow) -> Self {
        Self {
            id: row.id,
            job_id: row.job_id,
            status: row.status,
            start_time: row.start_time,
            end_time: row.end_time,
            result: row.result,
            error: row.error,
        }
    }
}

pub async fn get_execution(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ExecutionResponse>> {
    let execution = state.executions.get_execution(id).await?;
    Ok(Json(execution.into()))
}

#[derive(Debug, Deserialize)]
pub struct ListExecutionsQuery {
    #[serde(default)]
    pub page_size: i64,
    pub job_id: Option<Uuid>,
    pub status: Option<String>,
    pub last_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct ListExecutionsResponse {
    pub executions: Vec<ExecutionResponse>,
    pub total: usize,
    pub next_page: Option<Uuid>,
}

pub async fn list_executions(
    State(state): State<AppState>,
    Query(query): Query<ListExecutionsQuery>,
) -> ApiResult<Json<ListExecutionsResponse>> {
    let page = state
        .executions
        .list_executions(query.page_size, query.job_id, query.status.as_deref(), query.last_id)
        .await?;

    Ok(Json(ListExecutionsResponse {
        total: page.items.len(),
        executions: page.items.into_iter().map(ExecutionResponse::from).collect(),
        next_page: page.next_cursor,
    }))
}

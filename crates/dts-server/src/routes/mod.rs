//! Route modules for the thin JSON surface over the three RPC-shaped
//! services (spec §1: the gateway's CORS/logging/CLI concerns stay out
//! of scope, but *a* callable surface must exist for the binary to run).

pub mod executions;
pub mod jobs;
pub mod scheduler;

use crate::state::AppState;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/jobs", post(jobs::create_job).get(jobs::list_jobs))
        .route(
            "/api/v1/jobs/:id",
            get(jobs::get_job).put(jobs::update_job).delete(jobs::delete_job),
        )
        .route("/api/v1/jobs/:id/cancel", post(jobs::cancel_job))
        .route(
            "/api/v1/scheduled-jobs",
            post(scheduler::schedule_job).get(scheduler::list_scheduled_jobs),
        )
        .route(
            "/api/v1/scheduled-jobs/:id",
            get(scheduler::get_scheduled_job).delete(scheduler::cancel_scheduled_job),
        )
        .route("/api/v1/executions", get(executions::list_executions))
        .route("/api/v1/executions/:id", get(executions::get_execution))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

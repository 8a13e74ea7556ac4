//! Maps `dts_core::Error` onto the HTTP surface, mirroring the RPC
//! status taxonomy of spec §7.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use dts_core::error::Error as CoreError;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

pub struct HttpError {
    status: StatusCode,
    body: ApiError,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<CoreError> for HttpError {
    fn from(err: CoreError) -> Self {
        let status = match err.status_code() {
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "INVALID_ARGUMENT" => StatusCode::BAD_REQUEST,
            "FAILED_PRECONDITION" => StatusCode::CONFLICT,
            "RESOURCE_EXHAUSTED" => StatusCode::TOO_MANY_REQUESTS,
            "UNAVAILABLE" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        Self {
            status,
            body: ApiError {
                code: err.status_code().to_string(),
                message: err.to_string(),
            },
        }
    }
}

pub type ApiResult<T> = Result<T, HttpError>;

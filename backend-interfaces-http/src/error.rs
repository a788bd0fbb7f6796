use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use backend_application::AppError;

#[derive(Debug)]
pub enum HttpError {
    Unauthorized,
    BadRequest(String),
    NotFound(String),
    /// Retryable: the optimistic transaction ran out of attempts.
    Conflict(String),
    Forbidden(String),
    Locked(String),
    Internal(String),
}

impl From<AppError> for HttpError {
    fn from(value: AppError) -> Self {
        match value {
            AppError::Unauthorized => HttpError::Unauthorized,
            AppError::BadRequest(msg) => HttpError::BadRequest(msg),
            AppError::NotFound(msg) => HttpError::NotFound(msg),
            err @ AppError::TransactionConflict { .. } => HttpError::Conflict(err.to_string()),
            AppError::ScheduleClosed(msg) => HttpError::Forbidden(msg),
            AppError::Finalized(msg) => HttpError::Locked(msg),
            AppError::Internal(err) => {
                error!("request failed: {:#}", err);
                HttpError::Internal(err.to_string())
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    retryable: bool,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            HttpError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized".to_string()),
            HttpError::BadRequest(msg) => (StatusCode::BAD_REQUEST, format!("bad request: {}", msg)),
            HttpError::NotFound(msg) => (StatusCode::NOT_FOUND, format!("not found: {}", msg)),
            HttpError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            HttpError::Forbidden(msg) => (StatusCode::FORBIDDEN, format!("schedule closed: {}", msg)),
            HttpError::Locked(msg) => (StatusCode::LOCKED, format!("finalized: {}", msg)),
            HttpError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        let retryable = status == StatusCode::CONFLICT;
        (status, Json(ErrorBody { error: message, retryable })).into_response()
    }
}

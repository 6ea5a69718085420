use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use uuid::Uuid;

use crate::models::RequestStatus;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Shift {0} not found")]
    ShiftNotFound(Uuid),

    #[error("Replacement request {0} not found")]
    RequestNotFound(i64),

    #[error("Invalid partial range: {0}")]
    InvalidPartialRange(String),

    #[error("Request {id} is no longer pending (status: {status})")]
    RequestNotPending { id: i64, status: RequestStatus },

    #[error("No rate configured for {0}")]
    UnconfiguredRate(String),

    #[error("Cannot classify shift {shift_id} for payroll: {reason}")]
    UnclassifiableShift { shift_id: Uuid, reason: String },

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("{0}")]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    /// Stable machine-readable code, so clients can tell a raced accept
    /// apart from a rejection or a missing shift.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::ShiftNotFound(_) => "SHIFT_NOT_FOUND",
            AppError::RequestNotFound(_) => "REQUEST_NOT_FOUND",
            AppError::InvalidPartialRange(_) => "INVALID_PARTIAL_RANGE",
            AppError::RequestNotPending { .. } => "REQUEST_NOT_PENDING",
            AppError::UnconfiguredRate(_) => "UNCONFIGURED_RATE",
            AppError::UnclassifiableShift { .. } => "UNCLASSIFIABLE_SHIFT",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::ShiftNotFound(_) | AppError::RequestNotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidPartialRange(_) | AppError::UnconfiguredRate(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::RequestNotPending { .. } => StatusCode::CONFLICT,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::UnclassifiableShift { .. }
            | AppError::Database(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({
            "error": self.to_string(),
            "code": self.code(),
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

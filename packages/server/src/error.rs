use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::storage::StorageError;
use sea_orm::DbErr;
use serde::Serialize;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `TOKEN_MISSING`,
    /// `TOKEN_INVALID`, `NOT_FOUND`, `CONFLICT`, `WINDOW_NOT_OPEN`,
    /// `WINDOW_CLOSED`, `CODE_NOT_FOUND`, `CODE_ALREADY_USED`,
    /// `UPLOAD_FAILED`, `DOWNSTREAM_FAILED`, `INTERNAL_ERROR`.
    #[schema(example = "VALIDATION_ERROR")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "Caption 1 is required")]
    pub message: String,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    TokenMissing,
    TokenInvalid,
    NotFound(String),
    Conflict(String),
    WindowNotOpen,
    WindowClosed,
    CodeNotFound,
    CodeAlreadyUsed,
    /// Object storage rejected an upload. The caller may retry.
    Upload(String),
    /// A notification or ingestion sink failed. Only returned to event triggers.
    Downstream(String),
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "VALIDATION_ERROR",
                    message: msg,
                },
            ),
            AppError::TokenMissing => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "TOKEN_MISSING",
                    message: "Authentication required".into(),
                },
            ),
            AppError::TokenInvalid => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "TOKEN_INVALID",
                    message: "Invalid token".into(),
                },
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    code: "NOT_FOUND",
                    message: msg,
                },
            ),
            AppError::Conflict(msg) => (
                StatusCode::CONFLICT,
                ErrorBody {
                    code: "CONFLICT",
                    message: msg,
                },
            ),
            AppError::WindowNotOpen => (
                StatusCode::FORBIDDEN,
                ErrorBody {
                    code: "WINDOW_NOT_OPEN",
                    message: "Submissions are not yet open".into(),
                },
            ),
            AppError::WindowClosed => (
                StatusCode::FORBIDDEN,
                ErrorBody {
                    code: "WINDOW_CLOSED",
                    message: "Submissions are closed".into(),
                },
            ),
            AppError::CodeNotFound => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    code: "CODE_NOT_FOUND",
                    message: "Access code not found".into(),
                },
            ),
            AppError::CodeAlreadyUsed => (
                StatusCode::CONFLICT,
                ErrorBody {
                    code: "CODE_ALREADY_USED",
                    message: "Access code has already been used".into(),
                },
            ),
            AppError::Upload(detail) => {
                tracing::error!("Upload failed: {}", detail);
                (
                    StatusCode::BAD_GATEWAY,
                    ErrorBody {
                        code: "UPLOAD_FAILED",
                        message: "File upload failed, please try again".into(),
                    },
                )
            }
            AppError::Downstream(detail) => (
                StatusCode::BAD_GATEWAY,
                ErrorBody {
                    code: "DOWNSTREAM_FAILED",
                    message: detail,
                },
            ),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "INTERNAL_ERROR",
                        message: "An unexpected error occurred".into(),
                    },
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::SizeLimitExceeded { limit, .. } => {
                AppError::Validation(format!("File exceeds maximum size of {limit} bytes"))
            }
            StorageError::NotFound(key) => AppError::NotFound(format!("File '{key}' not found")),
            StorageError::InvalidKey(msg) => AppError::Validation(msg),
            other => AppError::Upload(other.to_string()),
        }
    }
}

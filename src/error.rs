use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Unauthenticated")]
    Unauthenticated,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Request body rejected: {0}")]
    JsonRejection(#[from] JsonRejection),

    #[error("Path rejected: {0}")]
    PathRejection(#[from] PathRejection),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable short name for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Unauthenticated => "unauthenticated",
            AppError::Forbidden(_) => "forbidden",
            AppError::NotFound(_) => "not_found",
            AppError::InvalidArgument(_) => "invalid_argument",
            AppError::InvalidState(_) => "invalid_state",
            AppError::InvalidFormat(_) | AppError::JsonRejection(_) => "invalid_format",
            AppError::PathRejection(_) => "invalid_argument",
            AppError::Database(_) | AppError::Pool(_) | AppError::Internal(_) => "internal",
        }
    }

    /// True for failures the caller caused, as opposed to storage or server faults.
    pub fn is_rejection(&self) -> bool {
        self.kind() != "internal"
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Unauthenticated => (StatusCode::UNAUTHORIZED, "Unauthenticated", None),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "Forbidden", Some(msg.clone())),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "Not found", Some(msg.clone())),
            AppError::InvalidArgument(msg) => {
                (StatusCode::BAD_REQUEST, "Invalid argument", Some(msg.clone()))
            }
            AppError::InvalidFormat(msg) => {
                (StatusCode::BAD_REQUEST, "Invalid format", Some(msg.clone()))
            }
            AppError::InvalidState(msg) => {
                (StatusCode::CONFLICT, "Invalid state", Some(msg.clone()))
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", None)
            }
            AppError::Pool(e) => {
                tracing::error!("Pool error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", None)
            }
            AppError::JsonRejection(e) => {
                (StatusCode::BAD_REQUEST, "Invalid JSON", Some(e.body_text()))
            }
            AppError::PathRejection(e) => {
                (StatusCode::BAD_REQUEST, "Invalid argument", Some(e.body_text()))
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

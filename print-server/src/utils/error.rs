//! Unified error handling
//!
//! - [`AppError`] - application error enum
//! - [`AppResponse`] - API response envelope
//!
//! # Error codes
//!
//! | code | status | meaning |
//! |------|--------|---------|
//! | E0000 | 200 | success |
//! | E0002 | 400 | validation failed (bad printer address) |
//! | E0003 | 404 | unknown printer |
//! | E0006 | 400 | malformed request |
//! | E9001 | 500 | internal error |

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use comanda_printer::PrintError;
use serde::Serialize;
use tracing::error;

/// API response envelope
///
/// ```json
/// {
///   "code": "E0000",
///   "message": "Success",
///   "data": { ... }
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct AppResponse<T> {
    /// Error code (E0000 on success)
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Resource not found: {0}")]
    /// 404
    NotFound(String),

    #[error("Invalid printer address: {0}")]
    /// 400, never retried
    InvalidAddress(String),

    #[error("Invalid request: {0}")]
    /// 400
    Invalid(String),

    #[error("Internal server error: {0}")]
    /// 500
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "E0003", msg.clone()),
            AppError::InvalidAddress(_) => (StatusCode::BAD_REQUEST, "E0002", self.to_string()),
            AppError::Invalid(msg) => (StatusCode::BAD_REQUEST, "E0006", msg.clone()),
            AppError::Internal(msg) => {
                error!(target: "internal", error = %msg, "Internal error occurred");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "E9001",
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(AppResponse::<()> {
            code: code.to_string(),
            message,
            data: None,
        });

        (status, body).into_response()
    }
}

impl From<PrintError> for AppError {
    fn from(e: PrintError) -> Self {
        match e {
            PrintError::InvalidAddress(msg) => AppError::InvalidAddress(msg),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(e: JsonRejection) -> Self {
        AppError::Invalid(e.body_text())
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// Create a successful response
pub fn ok<T: Serialize>(data: T) -> Json<AppResponse<T>> {
    Json(AppResponse {
        code: "E0000".to_string(),
        message: "Success".to_string(),
        data: Some(data),
    })
}

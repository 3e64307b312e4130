pub mod monitoring;

use std::backtrace::{Backtrace, BacktraceStatus};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

// ─── Unified error type ──────────────────────────────────────────

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    /// Label stored as `error_type` when the interceptor records this error.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NotFound",
            Self::BadRequest(_) => "BadRequest",
            Self::Forbidden(_) => "Forbidden",
            Self::Internal(_) => "Internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error details attached to a response as an extension so the request
/// tracking middleware can record them without re-parsing the body.
#[derive(Debug, Clone)]
pub struct ErrorInfo {
    pub error_type: String,
    pub message: String,
    pub stack_trace: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        // Only server faults carry a trace, and only when RUST_BACKTRACE enables it.
        let stack_trace = match self {
            Self::Internal(_) => {
                let bt = Backtrace::capture();
                (bt.status() == BacktraceStatus::Captured).then(|| bt.to_string())
            }
            _ => None,
        };

        let body = serde_json::json!({
            "error":  message,
            "status": status.as_u16(),
        });

        let mut response = (status, Json(body)).into_response();
        response.extensions_mut().insert(ErrorInfo {
            error_type: self.kind().to_owned(),
            message,
            stack_trace,
        });
        response
    }
}

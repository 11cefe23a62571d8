use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Main service error type
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Invalid request: {message}")]
    InvalidArgument { message: String },

    #[error("Page not found: {page}")]
    PageNotFound { page: u32 },

    #[error("Rasterizer tool not found: {tool}")]
    ToolNotFound { tool: String },

    #[error("Rasterization failed: {detail}")]
    RasterizationFailed { detail: String },

    #[error("Rasterization timed out after {seconds}s")]
    RasterizationTimeout { seconds: u64 },

    #[error("I/O error")]
    Io(#[source] std::io::Error),
}

/// API error response (matches Axum's built-in JsonRejection format)
#[derive(Serialize)]
pub struct ErrorResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::InvalidArgument { .. } => StatusCode::BAD_REQUEST,
            ServiceError::PageNotFound { .. } => StatusCode::NOT_FOUND,
            ServiceError::RasterizationTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            ServiceError::ToolNotFound { .. }
            | ServiceError::RasterizationFailed { .. }
            | ServiceError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            ServiceError::InvalidArgument { .. } => "invalid_argument",
            ServiceError::PageNotFound { .. } => "page_not_found",
            ServiceError::ToolNotFound { .. } => "tool_not_found",
            ServiceError::RasterizationFailed { .. } => "rasterization_failed",
            ServiceError::RasterizationTimeout { .. } => "rasterization_timeout",
            ServiceError::Io(_) => "io_error",
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code().to_string();

        let response = ErrorResponse {
            message: self.to_string(),
            code: Some(code),
            details: None,
        };

        (status, Json(response)).into_response()
    }
}

/// Result type alias for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

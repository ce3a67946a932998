//! Error responses of the REST API.
//!
//! Every failure is rendered as `{code, message, details?}` JSON.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::error::Error;

/// API error response body.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ApiErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Additional error details (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// API error type that can be converted to HTTP responses.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: String,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, "FORBIDDEN", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorResponse {
            code: self.code,
            message: self.message,
            details: self.details,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let code = match &err {
            Error::NotFound { .. } => {
                return ApiError::not_found(err.to_string());
            }
            Error::InvalidMethod(_) => "INVALID_METHOD",
            Error::MethodUnavailable(_) => "METHOD_UNAVAILABLE",
            Error::Delivery { .. } => "DELIVERY_FAILED",
            Error::Validation(_) => "VALIDATION_ERROR",
            Error::SelfTests(failures) => {
                let details = serde_json::to_value(failures).unwrap_or_default();
                return ApiError::new(StatusCode::BAD_REQUEST, "SELF_TEST_FAILED", err.to_string())
                    .with_details(details);
            }
            // Storage and I/O failures stay in the log; clients get a generic message.
            _ => {
                tracing::error!(error = %err, "Request failed on an internal error");
                return ApiError::internal("An internal error occurred");
            }
        };
        let message = match err {
            Error::Validation(msg) => msg,
            other => other.to_string(),
        };
        ApiError::new(StatusCode::BAD_REQUEST, code, message)
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

//! API error types and response handling.
//!
//! This module provides a unified error type for all API handlers
//! with automatic conversion to appropriate HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Result type alias for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type.
///
/// Each variant maps to a specific HTTP status code and produces a
/// consistent JSON error response.
#[derive(Debug, Clone)]
pub enum ApiError {
    /// 404 Not Found - Unknown timer or alarm.
    NotFound {
        /// Machine-readable error code.
        error_code: String,
        /// Human-readable error message.
        message: String,
    },

    /// 500 Internal Server Error - The state store rejected a write.
    InternalError {
        /// Machine-readable error code.
        error_code: String,
        /// Human-readable error message.
        message: String,
        /// Optional details.
        details: Option<String>,
    },

    /// 503 Service Unavailable - The engine has been shut down.
    ServiceUnavailable {
        /// Machine-readable error code.
        error_code: String,
        /// Human-readable error message.
        message: String,
    },
}

impl ApiError {
    /// The engine has already been flushed and released.
    pub fn engine_closed() -> Self {
        Self::ServiceUnavailable {
            error_code: "engine_closed".to_string(),
            message: "The engine is shutting down".to_string(),
        }
    }
}

/// Standard JSON error response body.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "error": "unknown_timer",
    "message": "Unknown timer: 'coolant'. Expected one of 'machine', 'spindle', 'running'.",
    "details": null
}))]
pub struct ErrorResponse {
    /// Machine-readable error code.
    #[schema(example = "unknown_timer")]
    pub error: String,

    /// Human-readable error message.
    pub message: String,

    /// Optional additional details for debugging.
    #[schema(nullable)]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_response) = match self {
            Self::NotFound { error_code, message } => (
                StatusCode::NOT_FOUND,
                ErrorResponse {
                    error: error_code,
                    message,
                    details: None,
                },
            ),

            Self::InternalError {
                error_code,
                message,
                details,
            } => {
                tracing::error!(
                    error_code = %error_code,
                    message = %message,
                    details = ?details,
                    "Internal server error"
                );

                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: error_code,
                        message,
                        details: details.map(|d| serde_json::json!(d)),
                    },
                )
            }

            Self::ServiceUnavailable { error_code, message } => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorResponse {
                    error: error_code,
                    message,
                    details: None,
                },
            ),
        };

        (status, Json(error_response)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { message, .. } => write!(f, "Not Found: {message}"),
            Self::InternalError { message, .. } => write!(f, "Internal Error: {message}"),
            Self::ServiceUnavailable { message, .. } => {
                write!(f, "Service Unavailable: {message}")
            }
        }
    }
}

impl std::error::Error for ApiError {}

/// Convert from hourmeter_core errors.
///
/// Only lookups and store writes reach handlers; anything else is a fault
/// on the server side.
impl From<hourmeter_core::HourmeterError> for ApiError {
    fn from(err: hourmeter_core::HourmeterError) -> Self {
        let error_code = err.error_code().to_ascii_lowercase();
        if err.is_lookup_error() {
            return Self::NotFound {
                error_code,
                message: err.to_string(),
            };
        }
        let message = if err.is_io_error() {
            "Failed to persist counters"
        } else {
            "Unexpected server error"
        };
        Self::InternalError {
            error_code,
            message: message.to_string(),
            details: Some(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hourmeter_core::HourmeterError;

    #[test]
    fn test_display_prefixes_status() {
        assert!(ApiError::engine_closed()
            .to_string()
            .starts_with("Service Unavailable"));
    }

    #[test]
    fn test_persistence_error_keeps_details() {
        let err = ApiError::from(HourmeterError::PersistenceError("disk full".into()));
        match err {
            ApiError::InternalError {
                error_code,
                message,
                details,
            } => {
                assert_eq!(error_code, "persistence_error");
                assert_eq!(message, "Failed to persist counters");
                assert!(details.unwrap().contains("disk full"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_unknown_timer_maps_to_not_found() {
        let err = ApiError::from(HourmeterError::UnknownTimer("coolant".into()));
        match err {
            ApiError::NotFound { error_code, message } => {
                assert_eq!(error_code, "unknown_timer");
                assert!(message.contains("coolant"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_status_codes() {
        let response = ApiError::engine_closed().into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let response =
            ApiError::from(HourmeterError::PersistenceError("disk full".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_error_response_serialization() {
        let response = ErrorResponse {
            error: "test_error".to_string(),
            message: "Test message".to_string(),
            details: None,
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("test_error"));
    }
}

//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use classlens_downstream::DownstreamError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed or missing client input, detected before any
    /// downstream call. Never retried.
    #[error("{0}")]
    Validation(String),

    /// A downstream failure that invalidated the whole frame.
    #[error("Pipeline Error: {message}")]
    Pipeline { message: String, details: String },

    /// Unknown service name on a proxy route.
    #[error("Service '{0}' not found")]
    UnknownService(String),

    /// Downstream service unreachable on a proxy route.
    #[error("{service} service is currently unavailable")]
    ServiceUnavailable { service: String, details: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn pipeline(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self::Pipeline {
            message: message.into(),
            details: details.into(),
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::UnknownService(_) => StatusCode::NOT_FOUND,
            ApiError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Pipeline { .. } | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<DownstreamError> for ApiError {
    fn from(err: DownstreamError) -> Self {
        let details = err.detail();
        ApiError::Pipeline {
            message: err.to_string(),
            details,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match self {
            ApiError::Pipeline { message, details } => ErrorBody {
                error: "Pipeline Error".to_string(),
                message: Some(message),
                details: Some(details),
            },
            ApiError::ServiceUnavailable { service, details } => ErrorBody {
                error: "Service Unavailable".to_string(),
                message: Some(format!("{service} service is currently unavailable")),
                details: Some(details),
            },
            other => ErrorBody {
                error: other.to_string(),
                message: None,
                details: None,
            },
        };

        (status, Json(body)).into_response()
    }
}

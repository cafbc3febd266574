//! Downstream client error types.

use thiserror::Error;

use crate::registry::Service;

pub type DownstreamResult<T> = Result<T, DownstreamError>;

/// Any failure talking to a downstream analysis service.
///
/// None of these are retried by the gateway; each aborts the enclosing
/// face analysis and, through the fail-fast join, the whole frame.
#[derive(Debug, Error)]
pub enum DownstreamError {
    #[error("{service} service returned {status}: {body}")]
    Status {
        service: Service,
        status: u16,
        body: String,
    },

    #[error("{service} service unreachable: {source}")]
    Transport {
        service: Service,
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid response from {service} service: {detail}")]
    InvalidResponse { service: Service, detail: String },

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

impl DownstreamError {
    /// The originating error body, for embedding in gateway error
    /// responses.
    pub fn detail(&self) -> String {
        match self {
            DownstreamError::Status { body, .. } if !body.is_empty() => body.clone(),
            _ => "No additional details available".to_string(),
        }
    }
}

//! Reverse-proxy passthrough for direct per-service access.

use axum::body::{Body, Bytes};
use axum::extract::{Path, RawQuery, State};
use axum::http::{header, HeaderMap, Method, Response};
use tracing::warn;

use classlens_downstream::Service;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// `/{service}/{*path}` under `/api`, any method.
///
/// Resolves the service name against the registry and relays the
/// request and the downstream response untouched. The downstream
/// status code passes through as-is, including errors.
pub async fn proxy(
    State(state): State<AppState>,
    Path((service_name, path)): Path<(String, String)>,
    method: Method,
    mut headers: HeaderMap,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> ApiResult<Response<Body>> {
    let service = Service::from_name(&service_name)
        .ok_or_else(|| ApiError::UnknownService(service_name.clone()))?;

    // The downstream service resolves its own host
    headers.remove(header::HOST);

    let path_and_query = match query {
        Some(query) => format!("{path}?{query}"),
        None => path,
    };

    let response = state
        .downstream
        .forward(service, method, &path_and_query, headers, body.to_vec())
        .await
        .map_err(|e| {
            warn!(service = %service, error = %e, "proxy request failed");
            ApiError::ServiceUnavailable {
                service: service.name().to_string(),
                details: e.to_string(),
            }
        })?;

    let status = response.status();
    let response_headers = response.headers().clone();
    let bytes = response.bytes().await.map_err(|e| {
        ApiError::ServiceUnavailable {
            service: service.name().to_string(),
            details: e.to_string(),
        }
    })?;

    let mut builder = Response::builder().status(status);
    for (name, value) in response_headers.iter() {
        // The relayed body is no longer chunked
        if name != &header::TRANSFER_ENCODING {
            builder = builder.header(name, value);
        }
    }

    builder
        .body(Body::from(bytes))
        .map_err(|e| ApiError::internal(format!("Failed to build proxy response: {e}")))
}

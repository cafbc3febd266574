//! Prometheus metrics for the gateway.

use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use classlens_downstream::Service;

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> PrometheusHandle {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus recorder")
}

/// Metric names as constants for consistency.
pub mod names {
    pub const HTTP_REQUESTS_TOTAL: &str = "classlens_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "classlens_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "classlens_http_requests_in_flight";
    pub const FRAMES_PROCESSED_TOTAL: &str = "classlens_frames_processed_total";
    pub const FACES_PER_FRAME: &str = "classlens_faces_per_frame";
    pub const RATE_LIMIT_HITS_TOTAL: &str = "classlens_rate_limit_hits_total";
}

/// Collapse dynamic path segments so a request path is safe to use as
/// a metric label. Proxied requests get one label per downstream
/// service; anything else unrouted shares a single bucket. Without
/// this, arbitrary client paths would mint unbounded label sets.
pub fn sanitize_path(path: &str) -> String {
    match path {
        "/health" | "/metrics" | "/api/process-frame" => return path.to_string(),
        _ => {}
    }

    let mut segments = path.trim_start_matches('/').split('/');
    if segments.next() == Some("api") {
        return match segments.next().and_then(Service::from_name) {
            Some(service) => format!("/api/{}/*", service.name()),
            None => "/api/:service/*".to_string(),
        };
    }

    "/unmatched".to_string()
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a fully processed frame and its detected face count.
pub fn record_frame_processed(faces: usize) {
    counter!(names::FRAMES_PROCESSED_TOTAL).increment(1);
    histogram!(names::FACES_PER_FRAME).record(faces as f64);
}

/// Record a rate limit rejection.
pub fn record_rate_limit_hit(path: &str) {
    counter!(names::RATE_LIMIT_HITS_TOTAL, "path" => sanitize_path(path)).increment(1);
}

/// HTTP metrics middleware.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);
    let response = next.run(request).await;
    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    record_http_request(
        &method,
        &path,
        response.status().as_u16(),
        start.elapsed().as_secs_f64(),
    );

    response
}

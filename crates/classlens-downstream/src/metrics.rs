//! Downstream call metrics.

use metrics::{counter, histogram};

use crate::registry::Service;

/// Metric name constants for consistency.
pub mod names {
    /// Total downstream requests by service and outcome.
    pub const REQUESTS_TOTAL: &str = "classlens_downstream_requests_total";

    /// Downstream request latency in seconds by service.
    pub const LATENCY_SECONDS: &str = "classlens_downstream_latency_seconds";
}

/// Record metrics for a completed downstream request.
pub fn record_request(service: Service, outcome: &str, latency_secs: f64) {
    counter!(
        names::REQUESTS_TOTAL,
        "service" => service.name(),
        "outcome" => outcome.to_string()
    )
    .increment(1);

    histogram!(
        names::LATENCY_SECONDS,
        "service" => service.name()
    )
    .record(latency_secs);
}

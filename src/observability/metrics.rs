//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define webhook metrics (requests, latency, handler and parse failures)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `webhook_requests_total` (counter): total requests by route, status
//! - `webhook_request_duration_seconds` (histogram): latency by route
//! - `webhook_handler_errors_total` (counter): handlers that returned an error
//! - `webhook_parse_errors_total` (counter): bodies that were not valid webhook JSON
//!
//! # Design Decisions
//! - Low-overhead metric updates (atomic operations)
//! - Labels for route and status code
//! - Recording without an installed exporter is a no-op

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Record one finished webhook request.
pub fn record_request(route: &str, status: u16, start: Instant) {
    metrics::counter!(
        "webhook_requests_total",
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("webhook_request_duration_seconds", "route" => route.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_handler_error(route: &str) {
    metrics::counter!("webhook_handler_errors_total", "route" => route.to_string()).increment(1);
}

pub fn record_parse_error(route: &str) {
    metrics::counter!("webhook_parse_errors_total", "route" => route.to_string()).increment(1);
}

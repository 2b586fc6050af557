//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): device calls by method, status
//! - `gateway_request_duration_seconds` (histogram): end-to-end latency
//! - `gateway_transform_total` (counter): transform outcomes
//! - `gateway_store_lookups_total` (counter): entity store queries by operation
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one handled device call.
pub fn record_request(method: &str, status: u16, start: Instant) {
    metrics::counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("gateway_request_duration_seconds", "method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}

/// Record a transform outcome: `skipped`, `unchanged`, `rewritten` or `failed`.
pub fn record_transform(outcome: &'static str) {
    metrics::counter!("gateway_transform_total", "outcome" => outcome).increment(1);
}

pub fn record_store_lookup(operation: &'static str) {
    metrics::counter!("gateway_store_lookups_total", "operation" => operation).increment(1);
}

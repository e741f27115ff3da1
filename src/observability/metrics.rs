//! Metrics collection and exposition.
//!
//! # Metrics
//! - `health_router_probes_total` (counter): probe results by service, result
//! - `health_router_healthy_backends` (gauge): addresses in the latest snapshot
//! - `health_router_tick_duration_seconds` (histogram): wall-clock time per tick
//! - `health_router_discovery_errors_total` (counter): by service
//! - `health_router_registry_writes_total` (counter): by service, result
//! - `health_router_selections_total` (counter): by service, result

use std::net::SocketAddr;
use std::time::Instant;
use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint. Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_probe(service: &str, healthy: bool) {
    let result = if healthy { "healthy" } else { "unhealthy" };
    metrics::counter!(
        "health_router_probes_total",
        "service" => service.to_string(),
        "result" => result
    )
    .increment(1);
}

pub fn record_snapshot(service: &str, healthy_count: usize) {
    metrics::gauge!("health_router_healthy_backends", "service" => service.to_string())
        .set(healthy_count as f64);
}

pub fn record_tick(start: Instant) {
    metrics::histogram!("health_router_tick_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_discovery_error(service: &str) {
    metrics::counter!("health_router_discovery_errors_total", "service" => service.to_string())
        .increment(1);
}

pub fn record_registry_write(service: &str, result: &'static str) {
    metrics::counter!(
        "health_router_registry_writes_total",
        "service" => service.to_string(),
        "result" => result
    )
    .increment(1);
}

pub fn record_selection(service: &str, result: &'static str) {
    metrics::counter!(
        "health_router_selections_total",
        "service" => service.to_string(),
        "result" => result
    )
    .increment(1);
}

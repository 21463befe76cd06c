//! Metrics collection and exposition.
//!
//! # Metrics
//! - `infra_api_dispatch_total` (counter): dispatch outcomes by route and outcome
//! - `infra_api_request_duration_seconds` (histogram): latency by route and status
//!
//! # Design Decisions
//! - Labels for route, outcome, status code
//! - Unmatched requests are labelled with route "none"

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

pub const DISPATCH_TOTAL: &str = "infra_api_dispatch_total";
pub const REQUEST_DURATION: &str = "infra_api_request_duration_seconds";

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to start metrics endpoint"),
    }
}

/// Count one dispatch outcome ("dispatched", "route_not_found", "resource_not_found").
pub fn record_dispatch(route: &str, outcome: &'static str) {
    metrics::counter!(DISPATCH_TOTAL, "route" => route.to_string(), "outcome" => outcome)
        .increment(1);
}

/// Record the total handling time of a request.
pub fn record_request(route: &str, status: u16, start: Instant) {
    metrics::histogram!(
        REQUEST_DURATION,
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

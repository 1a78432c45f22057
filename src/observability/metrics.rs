//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_outcomes_total` (counter): relayed calls by route and outcome kind
//! - `relay_upstream_duration_seconds` (histogram): upstream call latency by route

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_outcome(route: &'static str, kind: &'static str, elapsed: Duration) {
    counter!("relay_outcomes_total", "route" => route, "kind" => kind).increment(1);
    histogram!("relay_upstream_duration_seconds", "route" => route).record(elapsed.as_secs_f64());
}

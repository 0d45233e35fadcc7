//! Metrics collection and exposition.
//!
//! # Metrics
//! - `monitor_probes_total` (counter): probes by site and outcome
//! - `monitor_probe_duration_seconds` (histogram): probe latency by site
//! - `monitor_probes_in_flight` (gauge): probes currently holding a permit
//! - `monitor_site_availability` (gauge): 1=available, 0=unavailable, -1=unknown
//! - `monitor_snapshots_written_total` (counter): persisted global snapshots
//! - `monitor_persist_errors_total` (counter): failed log writes by record kind

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::monitor::Availability;

/// Install the Prometheus recorder and its HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_probe(site: &str, success: bool, latency: Duration) {
    let outcome = if success { "success" } else { "failure" };
    metrics::counter!("monitor_probes_total", "site" => site.to_string(), "outcome" => outcome).increment(1);
    metrics::histogram!("monitor_probe_duration_seconds", "site" => site.to_string()).record(latency.as_secs_f64());
}

pub fn record_site_availability(site: &str, availability: Availability) {
    metrics::gauge!("monitor_site_availability", "site" => site.to_string()).set(availability.as_gauge());
}

pub fn record_snapshot_written() {
    metrics::counter!("monitor_snapshots_written_total").increment(1);
}

pub fn record_persist_error(kind: &'static str) {
    metrics::counter!("monitor_persist_errors_total", "kind" => kind).increment(1);
}

/// Tracks one in-flight probe for the lifetime of the guard.
pub struct InFlightGuard(());

impl InFlightGuard {
    pub fn new() -> Self {
        metrics::gauge!("monitor_probes_in_flight").increment(1.0);
        Self(())
    }
}

impl Default for InFlightGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        metrics::gauge!("monitor_probes_in_flight").decrement(1.0);
    }
}

//! Metrics collection and exposition.
//!
//! # Metrics
//! - `firewall_requests_total` (counter): decisions by outcome and reason
//! - `firewall_audit_failures_total` (counter): audit records that could not be written
//! - `firewall_tracked_clients` (gauge): clients held by the rate limiter
//!
//! Recording is a no-op until [`init_metrics`] installs the Prometheus recorder.

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

use crate::pipeline::Decision;

/// Install the Prometheus recorder and its scrape listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, address = %addr, "Failed to install metrics exporter"),
    }
}

/// Count one admission decision.
pub fn record_decision(decision: &Decision) {
    let (outcome, reason) = match decision.reason() {
        None => ("allowed", "none"),
        Some(reason) => ("blocked", reason.label()),
    };
    ::metrics::counter!("firewall_requests_total", "outcome" => outcome, "reason" => reason)
        .increment(1);
}

pub fn record_audit_failure() {
    ::metrics::counter!("firewall_audit_failures_total").increment(1);
}

pub fn record_tracked_clients(count: usize) {
    ::metrics::gauge!("firewall_tracked_clients").set(count as f64);
}

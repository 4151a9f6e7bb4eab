//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gatekeeper_requests_total` (counter): requests that reached a handler, by route
//! - `gatekeeper_rejections_total` (counter): rejected requests, by reason code
//! - `gatekeeper_rate_limit_entries` (gauge): tracked clients, by policy
//! - `gatekeeper_logins_total` (counter): login attempts, by outcome
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(route: &'static str) {
    counter!("gatekeeper_requests_total", "route" => route).increment(1);
}

pub fn record_rejection(reason: &'static str) {
    counter!("gatekeeper_rejections_total", "reason" => reason).increment(1);
}

pub fn record_limiter_entries(policy: &'static str, entries: usize) {
    gauge!("gatekeeper_rate_limit_entries", "policy" => policy).set(entries as f64);
}

pub fn record_login(outcome: &'static str) {
    counter!("gatekeeper_logins_total", "outcome" => outcome).increment(1);
}

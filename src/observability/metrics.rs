//! Metrics collection and exposition.
//!
//! # Metrics
//! - `image_proxy_requests_total` (counter): requests by status and outcome
//! - `image_proxy_request_duration_seconds` (histogram): latency distribution
//! - `image_proxy_cache_lookups_total` (counter): hit / miss / error
//! - `image_proxy_cache_stores_total` (counter): ok / error
//! - `image_proxy_cache_entries` (gauge): size of the in-memory cache
//! - `image_proxy_cache_evictions_total` (counter): entries dropped by the LRU
//! - `image_proxy_upstream_requests_total` (counter): ok / error
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter, so
//! tests and embedded use need no setup.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a finished image request.
pub fn record_request(status: u16, outcome: &'static str, start: Instant) {
    counter!(
        "image_proxy_requests_total",
        "status" => status.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    histogram!("image_proxy_request_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_cache_lookup(result: &'static str) {
    counter!("image_proxy_cache_lookups_total", "result" => result).increment(1);
}

pub fn record_cache_store(result: &'static str) {
    counter!("image_proxy_cache_stores_total", "result" => result).increment(1);
}

pub fn record_cache_size(entries: usize) {
    gauge!("image_proxy_cache_entries").set(entries as f64);
}

pub fn record_cache_evictions(count: usize) {
    counter!("image_proxy_cache_evictions_total").increment(count as u64);
}

pub fn record_upstream(result: &'static str) {
    counter!("image_proxy_upstream_requests_total", "result" => result).increment(1);
}

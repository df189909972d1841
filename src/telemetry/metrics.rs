//! Request-level metrics recording on top of the value store.
//!
//! Thin wrappers so call sites read as intent ("a request succeeded") rather
//! than raw counter names.

use super::store::MetricsStore;

pub fn record_request_success(store: &MetricsStore, latency_ms: f64) {
    store.increment_counter("requests_total", 1);
    store.record_histogram("inference_latency_ms", latency_ms);
}

pub fn record_request_failure(store: &MetricsStore, kind: &str) {
    store.increment_counter("requests_total", 1);
    store.increment_counter("requests_failed", 1);
    store.increment_counter(&format!("requests_failed_{kind}"), 1);
}

pub fn record_connection_opened(store: &MetricsStore) {
    store.increment_counter("connections_opened", 1);
}

pub fn record_connection_closed(store: &MetricsStore) {
    store.increment_counter("connections_closed", 1);
}

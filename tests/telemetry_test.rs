//! Telemetry module tests for the model container runtime.

use std::path::PathBuf;

use vas_model_container::telemetry::{
    record_connection_closed, record_connection_opened, record_request_failure,
    record_request_success, LogConfig, LogError, LogFormat, MetricsStore,
};

// ----------------------------------------------------------------------
// LogConfig
// ----------------------------------------------------------------------

#[test]
fn log_config_default_is_json() {
    let config = LogConfig::default();
    assert_eq!(config.format, LogFormat::Json);
    assert_eq!(config.level, "info");
    assert!(config.output_path.is_none());
}

#[test]
fn log_config_custom_level() {
    let config = LogConfig { format: LogFormat::Pretty, level: "debug".to_string(), output_path: None };
    assert_eq!(config.format, LogFormat::Pretty);
    assert_eq!(config.level, "debug");
}

#[test]
fn log_config_with_output_path() {
    let config = LogConfig {
        format: LogFormat::Json,
        level: "trace".to_string(),
        output_path: Some(PathBuf::from("/tmp/test.log")),
    };
    assert_eq!(config.output_path, Some(PathBuf::from("/tmp/test.log")));
}

#[test]
fn log_format_equality() {
    assert_eq!(LogFormat::Json, LogFormat::Json);
    assert_ne!(LogFormat::Json, LogFormat::Pretty);
}

// ----------------------------------------------------------------------
// LogError
// ----------------------------------------------------------------------

#[test]
fn log_error_invalid_filter_display() {
    let error = LogError::InvalidFilter("bad filter".to_string());
    assert!(error.to_string().contains("Invalid log filter"));
    assert!(error.to_string().contains("bad filter"));
}

#[test]
fn log_error_already_initialized_display() {
    let error = LogError::AlreadyInitialized;
    assert!(error.to_string().contains("already initialized"));
}

// ----------------------------------------------------------------------
// Metrics
// ----------------------------------------------------------------------

#[test]
fn request_success_updates_counters_and_histogram() {
    let store = MetricsStore::new();
    record_request_success(&store, 12.5);
    record_request_success(&store, 7.0);

    let snapshot = store.snapshot();
    assert_eq!(snapshot.counters.get("requests_total"), Some(&2));
    let histogram = snapshot.histograms.get("inference_latency_ms").unwrap();
    assert_eq!(histogram.count, 2);
}

#[test]
fn request_failure_updates_counters_by_kind() {
    let store = MetricsStore::new();
    record_request_failure(&store, "validation");
    record_request_failure(&store, "validation");
    record_request_failure(&store, "inference");

    let snapshot = store.snapshot();
    assert_eq!(snapshot.counters.get("requests_total"), Some(&3));
    assert_eq!(snapshot.counters.get("requests_failed"), Some(&3));
    assert_eq!(snapshot.counters.get("requests_failed_validation"), Some(&2));
    assert_eq!(snapshot.counters.get("requests_failed_inference"), Some(&1));
}

#[test]
fn connection_lifecycle_counters() {
    let store = MetricsStore::new();
    record_connection_opened(&store);
    record_connection_opened(&store);
    record_connection_closed(&store);

    let snapshot = store.snapshot();
    assert_eq!(snapshot.counters.get("connections_opened"), Some(&2));
    assert_eq!(snapshot.counters.get("connections_closed"), Some(&1));
}

#[test]
fn mixed_success_and_failure_totals_combine() {
    let store = MetricsStore::new();
    record_request_success(&store, 5.0);
    record_request_failure(&store, "wrong_model");

    let snapshot = store.snapshot();
    assert_eq!(snapshot.counters.get("requests_total"), Some(&2));
    assert_eq!(snapshot.counters.get("requests_failed"), Some(&1));
}

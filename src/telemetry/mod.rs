//! Telemetry for the model container runtime.
//!
//! Provides structured logging and in-process metrics collection. All output
//! is file-based (stderr/file for logs) or served back over the existing IPC
//! socket (metrics snapshot) — no network dependencies, no HTTP exporter.

mod logging;
mod metrics;
mod store;

pub use logging::{init_logging, request_span, LogConfig, LogError, LogFormat};
pub use metrics::{
    record_connection_closed, record_connection_opened, record_request_failure,
    record_request_success,
};
pub use store::{HistogramSummary, MetricsSnapshot, MetricsStore};

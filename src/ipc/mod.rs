//! IPC module for the model container runtime.
//!
//! Handles Unix domain socket communication with callers on the same host.
//! This is the ONLY external interface - no HTTP/REST/WebSocket allowed.

mod connections;
mod handler;
pub mod protocol;
pub mod server;

pub use connections::{ConnectionGuard, ConnectionTracker};
pub use handler::{HandlerError, IpcHandler};
pub use protocol::{
    decode_message, encode_message, Detection, FrameMetadata, HealthCheckResponse,
    InferenceRequest, InferenceRequestConfig, InferenceResponse, IpcMessage, ProtocolError,
    ResponseMetadata, MAX_MESSAGE_SIZE,
};

// Re-export MetricsSnapshot for IPC consumers
pub use crate::telemetry::MetricsSnapshot;

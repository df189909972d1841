//! Wire format for the model-serving socket: length-prefixed JSON envelopes
//! carrying `InferenceRequest`/`InferenceResponse` plus the two internal
//! `health_check`/`metrics_request` message kinds, all on one connection.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::{InferenceConfig, RawDetection};
use crate::health::HealthReport;
use crate::telemetry::MetricsSnapshot;

/// Maximum framed message size, per the wire contract (10 MiB).
pub const MAX_MESSAGE_SIZE: usize = 10 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("invalid message format: {0}")]
    InvalidFormat(String),

    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("message too large: {size} bytes (max {max})")]
    MessageTooLarge { size: usize, max: usize },
}

/// A detection on the wire: normalized `[x_min, y_min, x_max, y_max]` plus
/// confidence and a resolved class name (falls back to `class_{id}` when no
/// sidecar class list was found for the model).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detection {
    pub class_id: u32,
    pub class_name: String,
    pub confidence: f32,
    pub bbox: [f32; 4],
    pub track_id: Option<u32>,
}

impl Detection {
    pub fn from_raw(raw: RawDetection, class_name: String) -> Self {
        Self {
            class_id: raw.class_id,
            class_name,
            confidence: raw.confidence,
            bbox: raw.bbox,
            track_id: None,
        }
    }
}

/// Describes the bytes at `frame_reference`: the frame reader's contract is
/// `(frame_reference, frame_metadata) -> bytes`, not the reference alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameMetadata {
    pub frame_id: i64,
    pub width: u32,
    pub height: u32,
    pub format: String,
    pub timestamp: f64,
}

/// Inference request from a caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceRequest {
    pub frame_reference: String,
    pub frame_metadata: FrameMetadata,
    pub camera_id: String,
    pub model_id: String,
    pub timestamp: f64,
    #[serde(default)]
    pub config: InferenceRequestConfig,
}

/// Per-request overrides; both fields optional, additive-only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InferenceRequestConfig {
    pub confidence_threshold: Option<f32>,
    pub nms_iou_threshold: Option<f32>,
}

impl From<InferenceRequestConfig> for InferenceConfig {
    fn from(config: InferenceRequestConfig) -> Self {
        InferenceConfig {
            confidence_threshold: config.confidence_threshold,
            nms_iou_threshold: config.nms_iou_threshold,
        }
    }
}

impl InferenceRequest {
    pub fn validate(&self) -> Result<(), ProtocolError> {
        if self.model_id.is_empty() {
            return Err(ProtocolError::MissingField("model_id".into()));
        }
        if self.camera_id.is_empty() {
            return Err(ProtocolError::MissingField("camera_id".into()));
        }
        if self.frame_reference.is_empty() {
            return Err(ProtocolError::MissingField("frame_reference".into()));
        }
        if self.frame_metadata.format.is_empty() {
            return Err(ProtocolError::MissingField("frame_metadata.format".into()));
        }
        if self.frame_metadata.width == 0 || self.frame_metadata.height == 0 {
            return Err(ProtocolError::InvalidFormat(
                "frame_metadata.width and frame_metadata.height must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Measured inference cost and execution target, attached to a successful
/// response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseMetadata {
    pub inference_time_ms: f64,
    pub device: String,
}

/// Inference response to a caller. `model_id`/`camera_id`/`frame_id` always
/// echo the request, success or failure, so a caller can correlate a
/// response without having kept the request around.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceResponse {
    pub model_id: String,
    pub camera_id: String,
    pub frame_id: i64,
    pub detections: Vec<Detection>,
    pub metadata: Option<ResponseMetadata>,
    pub error: Option<String>,
}

impl InferenceResponse {
    pub fn success(
        model_id: String,
        camera_id: String,
        frame_id: i64,
        detections: Vec<Detection>,
        inference_time_ms: f64,
        device: String,
    ) -> Self {
        Self {
            model_id,
            camera_id,
            frame_id,
            detections,
            metadata: Some(ResponseMetadata { inference_time_ms, device }),
            error: None,
        }
    }

    pub fn error(model_id: String, camera_id: String, frame_id: i64, error: String) -> Self {
        Self {
            model_id,
            camera_id,
            frame_id,
            detections: Vec::new(),
            metadata: None,
            error: Some(error),
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    pub report: HealthReport,
}

/// All message kinds carried over the single model-serving socket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum IpcMessage {
    #[serde(rename = "inference_request")]
    InferenceRequest(InferenceRequest),

    #[serde(rename = "inference_response")]
    InferenceResponse(InferenceResponse),

    #[serde(rename = "health_check")]
    HealthCheck,

    #[serde(rename = "health_response")]
    HealthResponse(HealthCheckResponse),

    #[serde(rename = "metrics_request")]
    MetricsRequest,

    #[serde(rename = "metrics_response")]
    MetricsResponse(MetricsSnapshot),

    #[serde(rename = "error")]
    Error { code: u32, message: String },
}

/// Encode a message to JSON bytes, enforcing the wire size cap.
pub fn encode_message(message: &IpcMessage) -> Result<Vec<u8>, ProtocolError> {
    let bytes = serde_json::to_vec(message)?;
    if bytes.len() > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge { size: bytes.len(), max: MAX_MESSAGE_SIZE });
    }
    Ok(bytes)
}

/// Decode a message from JSON bytes, enforcing the wire size cap.
pub fn decode_message(bytes: &[u8]) -> Result<IpcMessage, ProtocolError> {
    if bytes.len() > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge { size: bytes.len(), max: MAX_MESSAGE_SIZE });
    }
    Ok(serde_json::from_slice(bytes)?)
}

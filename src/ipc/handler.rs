//! Inference Handler (C4): the stateless per-request pipeline.
//!
//! `IpcHandler::handle` is the entire request lifecycle: decode, validate,
//! read the frame (C1), preprocess (C2), run inference (C3), and build the
//! response. No state is retained across calls.

use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;

use super::protocol::{
    decode_message, encode_message, Detection, HealthCheckResponse, InferenceRequest,
    InferenceResponse, IpcMessage, ProtocolError,
};
use crate::descriptor::ModelDescriptor;
use crate::engine::{preprocess, InferenceEngine};
use crate::frame;
use crate::health::HealthChecker;
use crate::shutdown::ShutdownCoordinator;
use crate::telemetry::{self, MetricsStore};

#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

/// Everything one request needs, wired once at startup and shared
/// read-only (or behind the engine's own lock) across every connection.
pub struct IpcHandler {
    engine: Arc<InferenceEngine>,
    descriptor: ModelDescriptor,
    class_names: Vec<String>,
    health: Arc<HealthChecker>,
    shutdown: Arc<ShutdownCoordinator>,
    metrics: Arc<MetricsStore>,
}

impl IpcHandler {
    pub fn new(
        engine: Arc<InferenceEngine>,
        descriptor: ModelDescriptor,
        class_names: Vec<String>,
        health: Arc<HealthChecker>,
        shutdown: Arc<ShutdownCoordinator>,
        metrics: Arc<MetricsStore>,
    ) -> Self {
        Self { engine, descriptor, class_names, health, shutdown, metrics }
    }

    /// Shared handle to the metrics store, for connection-lifecycle
    /// accounting done by the accept loop rather than per-message handling.
    pub fn metrics_handle(&self) -> Arc<MetricsStore> {
        self.metrics.clone()
    }

    /// Process one framed message and return the framed response bytes.
    pub async fn process(&self, bytes: &[u8]) -> Result<Vec<u8>, HandlerError> {
        let message = decode_message(bytes)?;
        let response = self.handle_message(message).await;
        Ok(encode_message(&response)?)
    }

    async fn handle_message(&self, message: IpcMessage) -> IpcMessage {
        match message {
            IpcMessage::InferenceRequest(request) => {
                IpcMessage::InferenceResponse(self.handle_inference(request).await)
            }
            IpcMessage::HealthCheck => {
                IpcMessage::HealthResponse(self.handle_health_check().await)
            }
            IpcMessage::MetricsRequest => IpcMessage::MetricsResponse(self.metrics.snapshot()),
            _ => IpcMessage::Error { code: 400, message: "unexpected message kind".into() },
        }
    }

    async fn handle_inference(&self, request: InferenceRequest) -> InferenceResponse {
        let model_id = request.model_id.clone();
        let camera_id = request.camera_id.clone();
        let frame_id = request.frame_metadata.frame_id;
        let span = telemetry::request_span(&model_id, &camera_id, frame_id);
        let _entered = span.enter();

        if request.model_id != self.descriptor.model_id {
            telemetry::record_request_failure(&self.metrics, "wrong_model");
            return InferenceResponse::error(
                model_id.clone(),
                camera_id,
                frame_id,
                format!("this container serves model_id={}", self.descriptor.model_id),
            );
        }

        if let Err(e) = request.validate() {
            telemetry::record_request_failure(&self.metrics, "validation");
            return InferenceResponse::error(model_id, camera_id, frame_id, e.to_string());
        }

        let started = Instant::now();
        match self.run_pipeline(&request).await {
            Ok(detections) => {
                let inference_time_ms = started.elapsed().as_secs_f64() * 1000.0;
                telemetry::record_request_success(&self.metrics, inference_time_ms);
                InferenceResponse::success(
                    model_id,
                    camera_id,
                    frame_id,
                    detections,
                    inference_time_ms,
                    self.engine.device().to_string(),
                )
            }
            Err(message) => {
                telemetry::record_request_failure(&self.metrics, "inference");
                InferenceResponse::error(model_id, camera_id, frame_id, message)
            }
        }
    }

    async fn run_pipeline(&self, request: &InferenceRequest) -> Result<Vec<Detection>, String> {
        let metadata = &request.frame_metadata;
        let frame = frame::read_frame(&request.frame_reference, metadata.width, metadata.height)
            .map_err(|e| e.to_string())?;

        let source = crate::descriptor::Resolution { width: metadata.width, height: metadata.height };
        let input = preprocess::preprocess(&frame, source, self.descriptor.expected_resolution)
            .map_err(|e| e.to_string())?;

        let config = request.config.clone().into();
        let (raw_detections, _latency_ms) =
            self.engine.infer(&input, &config).map_err(|e| e.to_string())?;

        Ok(raw_detections
            .into_iter()
            .map(|raw| {
                let name = self
                    .class_names
                    .get(raw.class_id as usize)
                    .cloned()
                    .unwrap_or_else(|| format!("class_{}", raw.class_id));
                Detection::from_raw(raw, name)
            })
            .collect())
    }

    async fn handle_health_check(&self) -> HealthCheckResponse {
        let state = self.shutdown.state().await;
        let snapshot = self.metrics.snapshot();
        let served = snapshot.counters.get("requests_total").copied().unwrap_or(0);
        let failed = snapshot.counters.get("requests_failed").copied().unwrap_or(0);
        let report = self.health.report(state, true, &self.engine.device().to_string(), served, failed);
        HealthCheckResponse { report }
    }
}

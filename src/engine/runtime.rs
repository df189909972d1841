//! Model Runtime (C3): owns the loaded backend and the single mutex around
//! its forward pass. Loaded once at startup; never swapped or reloaded.

use std::path::Path;
use std::time::Instant;

use parking_lot::Mutex;

use crate::descriptor::ModelDescriptor;
use crate::engine::backend::{load_backend, ModelBackend};
use crate::engine::device::{select_device, Accelerator, DeviceError};
use crate::engine::error::InferenceError;
use crate::engine::postprocess::{postprocess, RawDetection};
use crate::engine::preprocess::PreprocessedInput;

/// Per-request overrides. Both fields are optional and additive-only — a
/// missing field means "use the descriptor's default", never "disable".
#[derive(Debug, Clone, Default)]
pub struct InferenceConfig {
    pub confidence_threshold: Option<f32>,
    pub nms_iou_threshold: Option<f32>,
}

/// The loaded model plus the device it's resident on.
pub struct InferenceEngine {
    descriptor: ModelDescriptor,
    device: Accelerator,
    backend: Mutex<Box<dyn ModelBackend>>,
}

impl InferenceEngine {
    /// Resolve the device (fatal if `gpu_required` and none present) and
    /// load the backend matching `descriptor.model_type`.
    pub fn load(
        descriptor: ModelDescriptor,
        weights_path: &Path,
        detected_accelerator: Option<Accelerator>,
    ) -> Result<Self, InferenceError> {
        let device = select_device(&descriptor, detected_accelerator).map_err(|e| match e {
            DeviceError::FatalNoAccelerator => InferenceError::AcceleratorRequired,
        })?;

        let backend = load_backend(&descriptor, weights_path, device)?;

        Ok(Self { descriptor, device, backend: Mutex::new(backend) })
    }

    /// Wrap an already-constructed backend directly, skipping device
    /// selection and weight loading. Used by callers that build the
    /// backend themselves, e.g. tests driving the pipeline against a fake
    /// backend rather than real model weights.
    pub fn from_backend(descriptor: ModelDescriptor, device: Accelerator, backend: Box<dyn ModelBackend>) -> Self {
        Self { descriptor, device, backend: Mutex::new(backend) }
    }

    pub fn descriptor(&self) -> &ModelDescriptor {
        &self.descriptor
    }

    pub fn device(&self) -> Accelerator {
        self.device
    }

    /// Run inference and post-processing. The forward pass itself is
    /// serialized by the backend mutex; everything else in this call runs
    /// outside any lock.
    pub fn infer(
        &self,
        input: &PreprocessedInput,
        config: &InferenceConfig,
    ) -> Result<(Vec<RawDetection>, u64), InferenceError> {
        let confidence_threshold =
            config.confidence_threshold.unwrap_or(self.descriptor.confidence_threshold);
        let nms_iou_threshold = config
            .nms_iou_threshold
            .or(self.descriptor.nms_iou_threshold)
            .filter(|t| *t > 0.0);

        let started = Instant::now();
        let raw = {
            let backend = self.backend.lock();
            backend.infer(input)?
        };
        let latency_ms = started.elapsed().as_millis() as u64;

        let detections = postprocess(raw, confidence_threshold, nms_iou_threshold);
        Ok((detections, latency_ms))
    }
}

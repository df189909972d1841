//! `ModelBackend`: the capability set both runtime families implement.
//!
//! Generalizes the async `OnnxModel` trait this container's teacher used
//! for its graph-execution backend into a two-family abstraction: a
//! framework-style backend (tensors built and run in-process, errors can
//! come back as library exceptions) and a graph-execution backend (a
//! serialized graph run by an external engine, errors are status codes).
//! Both are driven through the identical `load` / `infer` shape so C4 never
//! needs to know which family it's talking to.

use std::path::Path;

use crate::descriptor::ModelDescriptor;
use crate::engine::device::Accelerator;
use crate::engine::error::InferenceError;
use crate::engine::postprocess::RawDetection;
use crate::engine::preprocess::PreprocessedInput;

/// A loaded model ready to run the forward pass.
pub trait ModelBackend: Send + Sync {
    /// Run the forward pass and decode its output into detections. Bboxes
    /// must be normalized to `[0, 1]` against the model's input resolution;
    /// thresholding/NMS/clipping happen afterward in `postprocess`.
    fn infer(&self, input: &PreprocessedInput) -> Result<Vec<RawDetection>, InferenceError>;

    /// Device this backend's weights are resident on.
    fn device(&self) -> Accelerator;
}

/// Load the backend matching `descriptor.model_type`, onto `device`.
pub fn load_backend(
    descriptor: &ModelDescriptor,
    weights_path: &Path,
    device: Accelerator,
) -> Result<Box<dyn ModelBackend>, InferenceError> {
    match descriptor.model_type {
        crate::descriptor::ModelType::PytorchLike => {
            #[cfg(feature = "pytorch-like")]
            {
                let backend = super::candle_backend::CandleBackend::load(descriptor, weights_path, device)?;
                Ok(Box::new(backend))
            }
            #[cfg(not(feature = "pytorch-like"))]
            {
                let _ = (descriptor, weights_path, device);
                Err(InferenceError::Backend(
                    "built without the pytorch-like backend feature".into(),
                ))
            }
        }
        crate::descriptor::ModelType::OnnxLike => {
            #[cfg(feature = "onnx-like")]
            {
                let backend = super::onnx_backend::OnnxBackend::load(descriptor, weights_path, device)?;
                Ok(Box::new(backend))
            }
            #[cfg(not(feature = "onnx-like"))]
            {
                let _ = (descriptor, weights_path, device);
                Err(InferenceError::Backend(
                    "built without the onnx-like backend feature".into(),
                ))
            }
        }
    }
}

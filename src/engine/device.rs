//! Accelerator detection and device selection (C3 §4.5 device table).
//!
//! Adapted from the GPU backend/manager pair this runtime used for LLM GPU
//! offload: the device-enumeration and selection skeleton survives, but
//! layer-splitting, multi-GPU, and memory accounting are dropped since the
//! model container places the whole model on exactly one device.

use std::fmt;

use thiserror::Error;

use crate::descriptor::ModelDescriptor;

/// Compute backend a device belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Accelerator {
    Cuda,
    Metal,
    Cpu,
}

impl fmt::Display for Accelerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Accelerator::Cuda => write!(f, "cuda"),
            Accelerator::Metal => write!(f, "metal"),
            Accelerator::Cpu => write!(f, "cpu"),
        }
    }
}

/// Errors raised while selecting a device. `Fatal` variants are
/// process-fatal at startup per the device-selection table: the container
/// must exit non-zero rather than silently degrade.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("model requires an accelerator but none is present and cpu fallback is not allowed")]
    FatalNoAccelerator,
}

/// Probe the host for an available accelerator. In a real deployment this
/// inspects the CUDA/Metal runtime; the container build only ever detects
/// what its compiled feature set can actually drive.
pub fn detect_accelerator() -> Option<Accelerator> {
    #[cfg(feature = "cuda-detect")]
    {
        return Some(Accelerator::Cuda);
    }
    #[cfg(all(feature = "metal-detect", target_os = "macos"))]
    {
        return Some(Accelerator::Metal);
    }
    #[allow(unreachable_code)]
    None
}

/// Resolve the device a descriptor's model must run on, per the table:
///
/// | gpu_required | accelerator present | cpu_fallback_allowed | outcome |
/// |---|---|---|---|
/// | true  | true  | n/a   | accelerator |
/// | true  | false | n/a   | fatal |
/// | false | true  | n/a   | accelerator |
/// | false | false | n/a   | cpu |
///
/// `cpu_fallback_allowed` is only consulted when `gpu_required` is true and
/// no accelerator is present; `ModelDescriptor::validate` already rejects
/// `gpu_required && cpu_fallback_allowed` together, so fallback never
/// silently happens when a GPU actually was required.
pub fn select_device(
    descriptor: &ModelDescriptor,
    detected: Option<Accelerator>,
) -> Result<Accelerator, DeviceError> {
    match (descriptor.gpu_required, detected) {
        (true, Some(accel)) => Ok(accel),
        (true, None) => Err(DeviceError::FatalNoAccelerator),
        (false, Some(accel)) => Ok(accel),
        (false, None) => Ok(Accelerator::Cpu),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{InputFormat, ModelType, Resolution, SupportedTask};
    use std::path::PathBuf;

    fn descriptor(gpu_required: bool) -> ModelDescriptor {
        ModelDescriptor {
            model_id: "m".into(),
            model_name: "m".into(),
            model_version: "1".into(),
            supported_tasks: vec![SupportedTask::ObjectDetection],
            input_format: InputFormat::Nv12,
            expected_resolution: Resolution { width: 640, height: 480 },
            gpu_required,
            gpu_memory_mb: None,
            cpu_fallback_allowed: !gpu_required,
            model_type: ModelType::OnnxLike,
            model_weights: PathBuf::from("weights.onnx"),
            confidence_threshold: 0.5,
            nms_iou_threshold: Some(0.45),
            output_schema: "detections_v1".into(),
        }
    }

    #[test]
    fn gpu_required_with_accelerator_selects_it() {
        let d = descriptor(true);
        assert_eq!(select_device(&d, Some(Accelerator::Cuda)).unwrap(), Accelerator::Cuda);
    }

    #[test]
    fn gpu_required_without_accelerator_is_fatal() {
        let d = descriptor(true);
        assert!(matches!(select_device(&d, None), Err(DeviceError::FatalNoAccelerator)));
    }

    #[test]
    fn gpu_not_required_prefers_accelerator_when_present() {
        let d = descriptor(false);
        assert_eq!(select_device(&d, Some(Accelerator::Metal)).unwrap(), Accelerator::Metal);
    }

    #[test]
    fn gpu_not_required_falls_back_to_cpu() {
        let d = descriptor(false);
        assert_eq!(select_device(&d, None).unwrap(), Accelerator::Cpu);
    }
}

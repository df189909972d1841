//! Model descriptor parsing and validation (`model.yaml`).
//!
//! Descriptors are fail-closed: any parse or validation failure yields no
//! descriptor at all rather than a partially-populated one. Mirrors the
//! manifest-validation discipline of the JSON model manifest this module
//! descends from, adapted to YAML and the video-analytics field set.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A model task family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupportedTask {
    ObjectDetection,
    Classification,
    Segmentation,
}

/// Input pixel format the model expects from the Preprocessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputFormat {
    Nv12,
}

/// Which runtime family loads and runs this model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    /// Framework-style runtime (tensor graph built and run in-process).
    PytorchLike,
    /// Graph-execution runtime (serialized graph, status-return errors).
    OnnxLike,
}

/// Model input resolution, `[width, height]`, both strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

/// Parsed, validated `model.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub model_id: String,
    pub model_name: String,
    pub model_version: String,
    pub supported_tasks: Vec<SupportedTask>,
    pub input_format: InputFormat,
    pub expected_resolution: Resolution,
    pub gpu_required: bool,
    pub gpu_memory_mb: Option<u32>,
    pub cpu_fallback_allowed: bool,
    pub model_type: ModelType,
    pub model_weights: PathBuf,
    pub confidence_threshold: f32,
    #[serde(default)]
    pub nms_iou_threshold: Option<f32>,
    pub output_schema: String,
}

/// Errors raised while loading or validating a descriptor.
#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("failed to read descriptor at {path}: {source}")]
    Io { path: PathBuf, #[source] source: std::io::Error },

    #[error("invalid YAML in descriptor: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("{0}")]
    Invalid(String),
}

impl ModelDescriptor {
    /// Load and fully validate a descriptor from `path`.
    pub fn from_file(path: &Path) -> Result<Self, DescriptorError> {
        let content = std::fs::read_to_string(path)
            .map_err(|source| DescriptorError::Io { path: path.to_path_buf(), source })?;
        let descriptor: ModelDescriptor = serde_yaml::from_str(&content)?;
        descriptor.validate()?;
        Ok(descriptor)
    }

    /// Cross-field and range validation. A descriptor that fails this never
    /// becomes available for discovery or loading.
    pub fn validate(&self) -> Result<(), DescriptorError> {
        if self.model_id.trim().is_empty() {
            return Err(DescriptorError::Invalid("model_id cannot be empty".into()));
        }
        if self.model_name.trim().is_empty() {
            return Err(DescriptorError::Invalid("model_name cannot be empty".into()));
        }
        if self.model_version.trim().is_empty() {
            return Err(DescriptorError::Invalid("model_version cannot be empty".into()));
        }
        if self.supported_tasks.is_empty() {
            return Err(DescriptorError::Invalid("supported_tasks cannot be empty".into()));
        }
        if self.expected_resolution.width == 0 || self.expected_resolution.height == 0 {
            return Err(DescriptorError::Invalid(
                "expected_resolution must have positive width and height".into(),
            ));
        }
        if self.gpu_required && self.cpu_fallback_allowed {
            return Err(DescriptorError::Invalid(
                "gpu_required and cpu_fallback_allowed are mutually exclusive".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(DescriptorError::Invalid(
                "confidence_threshold must be in [0, 1]".into(),
            ));
        }
        if let Some(nms_iou_threshold) = self.nms_iou_threshold {
            if !(0.0..=1.0).contains(&nms_iou_threshold) {
                return Err(DescriptorError::Invalid("nms_iou_threshold must be in [0, 1]".into()));
            }
        }
        if self.model_weights.as_os_str().is_empty() {
            return Err(DescriptorError::Invalid("model_weights cannot be empty".into()));
        }
        Ok(())
    }

    /// Resolve the weights path relative to the directory the descriptor
    /// itself lives in.
    pub fn resolved_weights_path(&self, descriptor_dir: &Path) -> PathBuf {
        if self.model_weights.is_absolute() {
            self.model_weights.clone()
        } else {
            descriptor_dir.join(&self.model_weights)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_yaml() -> &'static str {
        r#"
model_id: vehicle-detector-v1
model_name: Vehicle Detector
model_version: "1.0.0"
supported_tasks: [object_detection]
input_format: nv12
expected_resolution: { width: 640, height: 480 }
gpu_required: false
gpu_memory_mb: null
cpu_fallback_allowed: true
model_type: onnx_like
model_weights: weights.onnx
confidence_threshold: 0.5
nms_iou_threshold: 0.45
output_schema: detections_v1
"#
    }

    #[test]
    fn parses_valid_descriptor() {
        let descriptor: ModelDescriptor = serde_yaml::from_str(valid_yaml()).unwrap();
        descriptor.validate().unwrap();
        assert_eq!(descriptor.model_id, "vehicle-detector-v1");
        assert_eq!(descriptor.expected_resolution.width, 640);
    }

    #[test]
    fn rejects_gpu_required_with_cpu_fallback() {
        let yaml = valid_yaml().replace("gpu_required: false", "gpu_required: true");
        let descriptor: ModelDescriptor = serde_yaml::from_str(&yaml).unwrap();
        assert!(descriptor.validate().is_err());
    }

    #[test]
    fn accepts_missing_nms_iou_threshold() {
        let yaml = valid_yaml().replace("nms_iou_threshold: 0.45\n", "");
        let descriptor: ModelDescriptor = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(descriptor.nms_iou_threshold, None);
        descriptor.validate().unwrap();
    }

    #[test]
    fn rejects_out_of_range_nms_iou_threshold_when_present() {
        let yaml = valid_yaml().replace("nms_iou_threshold: 0.45", "nms_iou_threshold: 1.5");
        let descriptor: ModelDescriptor = serde_yaml::from_str(&yaml).unwrap();
        assert!(descriptor.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        let yaml = valid_yaml().replace("confidence_threshold: 0.5", "confidence_threshold: 1.5");
        let descriptor: ModelDescriptor = serde_yaml::from_str(&yaml).unwrap();
        assert!(descriptor.validate().is_err());
    }

    #[test]
    fn rejects_zero_resolution() {
        let yaml = valid_yaml().replace("width: 640", "width: 0");
        let descriptor: ModelDescriptor = serde_yaml::from_str(&yaml).unwrap();
        assert!(descriptor.validate().is_err());
    }

    #[test]
    fn rejects_empty_model_id() {
        let yaml = valid_yaml().replace("vehicle-detector-v1", "");
        let descriptor: ModelDescriptor = serde_yaml::from_str(&yaml).unwrap();
        assert!(descriptor.validate().is_err());
    }

    #[test]
    fn resolves_relative_weights_path() {
        let descriptor: ModelDescriptor = serde_yaml::from_str(valid_yaml()).unwrap();
        let resolved = descriptor.resolved_weights_path(Path::new("/models/vehicle-detector-v1"));
        assert_eq!(resolved, PathBuf::from("/models/vehicle-detector-v1/weights.onnx"));
    }
}

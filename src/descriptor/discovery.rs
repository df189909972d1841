//! One-shot filesystem discovery of model directories (C7).
//!
//! Scans `models_root` for immediate subdirectories, attempts to load and
//! validate a `model.yaml` in each, and classifies the result. Discovery
//! never recurses and never retries; a missing `models_root` yields an
//! empty, non-fatal registry rather than an error.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::schema::{DescriptorError, ModelDescriptor};

/// Why a candidate model directory was not made available.
#[derive(Debug, Clone, Serialize)]
pub enum UnavailableReason {
    MissingModelYaml,
    InvalidModelYaml(String),
    MissingWeights,
}

/// Outcome of scanning every model directory under `models_root`.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryRegistry {
    available: HashMap<String, ModelDescriptor>,
    unavailable: HashMap<String, UnavailableReason>,
}

impl DiscoveryRegistry {
    pub fn available(&self) -> &HashMap<String, ModelDescriptor> {
        &self.available
    }

    pub fn unavailable(&self) -> &HashMap<String, UnavailableReason> {
        &self.unavailable
    }

    pub fn get(&self, model_id: &str) -> Option<&ModelDescriptor> {
        self.available.get(model_id)
    }

    pub fn is_empty(&self) -> bool {
        self.available.is_empty() && self.unavailable.is_empty()
    }
}

/// Scan `models_root` once, producing a populated [`DiscoveryRegistry`].
///
/// A missing `models_root` directory is not an error: it simply discovers
/// nothing. Each entry directory is evaluated independently so one broken
/// descriptor never prevents its siblings from being discovered.
pub fn discover(models_root: &Path) -> DiscoveryRegistry {
    let mut registry = DiscoveryRegistry::default();

    let entries = match std::fs::read_dir(models_root) {
        Ok(entries) => entries,
        Err(_) => return registry,
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let dir_name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_string(),
            None => continue,
        };

        classify_one(&path, &dir_name, &mut registry);
    }

    registry
}

fn classify_one(dir: &Path, dir_name: &str, registry: &mut DiscoveryRegistry) {
    let descriptor_path = dir.join("model.yaml");
    if !descriptor_path.exists() {
        registry.unavailable.insert(dir_name.to_string(), UnavailableReason::MissingModelYaml);
        return;
    }

    let descriptor = match ModelDescriptor::from_file(&descriptor_path) {
        Ok(descriptor) => descriptor,
        Err(err) => {
            let message = match err {
                DescriptorError::Io { source, .. } => source.to_string(),
                DescriptorError::Parse(e) => e.to_string(),
                DescriptorError::Invalid(msg) => msg,
            };
            registry
                .unavailable
                .insert(dir_name.to_string(), UnavailableReason::InvalidModelYaml(message));
            return;
        }
    };

    let weights_path = descriptor.resolved_weights_path(dir);
    if !weights_path.exists() {
        registry.unavailable.insert(dir_name.to_string(), UnavailableReason::MissingWeights);
        return;
    }

    registry.available.insert(descriptor.model_id.clone(), descriptor);
}

/// Resolve the model directory a given descriptor was discovered in, used
/// by discovery-adjacent tooling that needs the directory back.
pub fn model_dir(models_root: &Path, model_dir_name: &str) -> PathBuf {
    models_root.join(model_dir_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_descriptor(dir: &Path, model_id: &str) {
        let yaml = format!(
            r#"
model_id: {model_id}
model_name: Test Model
model_version: "1.0.0"
supported_tasks: [object_detection]
input_format: nv12
expected_resolution: {{ width: 320, height: 240 }}
gpu_required: false
gpu_memory_mb: null
cpu_fallback_allowed: true
model_type: onnx_like
model_weights: weights.bin
confidence_threshold: 0.5
nms_iou_threshold: 0.45
output_schema: detections_v1
"#
        );
        std::fs::write(dir.join("model.yaml"), yaml).unwrap();
    }

    #[test]
    fn missing_root_is_empty_not_fatal() {
        let registry = discover(Path::new("/nonexistent/path/for/sure"));
        assert!(registry.is_empty());
    }

    #[test]
    fn classifies_available_and_unavailable() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();

        let good = root.join("good-model");
        std::fs::create_dir(&good).unwrap();
        write_descriptor(&good, "good-model");
        std::fs::write(good.join("weights.bin"), b"fake").unwrap();

        let missing_yaml = root.join("no-descriptor");
        std::fs::create_dir(&missing_yaml).unwrap();

        let missing_weights = root.join("no-weights");
        std::fs::create_dir(&missing_weights).unwrap();
        write_descriptor(&missing_weights, "no-weights");

        let invalid = root.join("bad-yaml");
        std::fs::create_dir(&invalid).unwrap();
        let mut f = std::fs::File::create(invalid.join("model.yaml")).unwrap();
        writeln!(f, "not: [valid, yaml: structure").unwrap();

        let registry = discover(root);
        assert!(registry.get("good-model").is_some());
        assert!(matches!(
            registry.unavailable().get("no-descriptor"),
            Some(UnavailableReason::MissingModelYaml)
        ));
        assert!(matches!(
            registry.unavailable().get("no-weights"),
            Some(UnavailableReason::MissingWeights)
        ));
        assert!(matches!(
            registry.unavailable().get("bad-yaml"),
            Some(UnavailableReason::InvalidModelYaml(_))
        ));
    }
}

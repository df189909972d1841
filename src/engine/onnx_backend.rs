//! Graph-execution backend: an ONNX Runtime session. Every call returns a
//! `Result` natively — there is no exception path to catch, unlike the
//! framework backend.

use std::path::Path;
use std::sync::Mutex;

use ndarray::Array4;
use ort::session::Session;
use ort::value::Value;

use crate::descriptor::ModelDescriptor;
use crate::engine::backend::ModelBackend;
use crate::engine::device::Accelerator;
use crate::engine::error::InferenceError;
use crate::engine::postprocess::RawDetection;
use crate::engine::preprocess::PreprocessedInput;

pub struct OnnxBackend {
    device: Accelerator,
    // ort::Session::run takes &mut self in some versions; a Mutex keeps the
    // forward pass single-threaded regardless, matching the container-wide
    // forward-pass lock this backend sits behind anyway.
    session: Mutex<Session>,
}

impl OnnxBackend {
    pub fn load(
        descriptor: &ModelDescriptor,
        weights_path: &Path,
        device: Accelerator,
    ) -> Result<Self, InferenceError> {
        let session = Session::builder()
            .map_err(|e| InferenceError::Backend(format!("failed to create session builder: {e}")))?
            .commit_from_file(weights_path)
            .map_err(|e| InferenceError::Backend(format!("failed to load onnx graph: {e}")))?;

        let _ = descriptor;
        Ok(Self { device, session: Mutex::new(session) })
    }
}

impl ModelBackend for OnnxBackend {
    fn infer(&self, input: &PreprocessedInput) -> Result<Vec<RawDetection>, InferenceError> {
        let [n, c, h, w] = input.shape;
        let array = Array4::from_shape_vec((n, c, h, w), input.data.clone())
            .map_err(|e| InferenceError::Backend(format!("invalid input shape: {e}")))?;

        let input_value = Value::from_array(array)
            .map_err(|e| InferenceError::Backend(format!("failed to build input value: {e}")))?;

        let mut session = self.session.lock().expect("onnx session mutex poisoned");
        let outputs = session
            .run(ort::inputs![input_value])
            .map_err(|e| InferenceError::Backend(format!("onnx run failed: {e}")))?;

        let (shape, data) = outputs[0]
            .try_extract_raw_tensor::<f32>()
            .map_err(|e| InferenceError::Backend(format!("failed to read output tensor: {e}")))?;

        decode_detections(shape, data)
    }

    fn device(&self) -> Accelerator {
        self.device
    }
}

/// Decode an output tensor shaped `[1, num_detections, 6]`, rows of
/// `[x1, y1, x2, y2, confidence, class_id]`.
fn decode_detections(shape: &[i64], data: &[f32]) -> Result<Vec<RawDetection>, InferenceError> {
    let row_len = 6usize;
    if shape.len() != 3 || shape[2] != row_len as i64 {
        return Err(InferenceError::InvalidOutputSchema(format!(
            "expected [1, N, 6] output, got shape {shape:?}"
        )));
    }

    Ok(data
        .chunks_exact(row_len)
        .map(|row| RawDetection {
            class_id: row[5].max(0.0) as u32,
            confidence: row[4],
            bbox: [row[0], row[1], row[2], row[3]],
        })
        .collect())
}

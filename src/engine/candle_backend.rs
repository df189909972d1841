//! Framework-like backend: a `candle` model, loaded once, run under the
//! shared forward-pass mutex. Candle surfaces `candle_core::Error` from
//! deep inside tensor ops the way a Python framework surfaces exceptions,
//! so every op here is wrapped and turned into `InferenceError::Backend`.

use std::path::Path;

use candle_core::{DType, Device, Tensor};
use candle_nn::{Conv2d, Conv2dConfig, Linear, Module, VarBuilder};

use crate::descriptor::ModelDescriptor;
use crate::engine::backend::ModelBackend;
use crate::engine::device::Accelerator;
use crate::engine::error::InferenceError;
use crate::engine::postprocess::RawDetection;
use crate::engine::preprocess::PreprocessedInput;

/// A compact single-stage detector head: a few stride-2 conv blocks
/// followed by a linear projection to `[x1, y1, x2, y2, confidence,
/// class_id]` rows. Weight tensor names are resolved from the model's
/// safetensors file via `VarBuilder`.
struct DetectorHead {
    conv1: Conv2d,
    conv2: Conv2d,
    head: Linear,
    max_detections: usize,
}

impl DetectorHead {
    fn load(vb: VarBuilder, max_detections: usize) -> candle_core::Result<Self> {
        let conv1 = candle_nn::conv2d(3, 16, 3, Conv2dConfig { stride: 2, padding: 1, ..Default::default() }, vb.pp("conv1"))?;
        let conv2 = candle_nn::conv2d(16, 32, 3, Conv2dConfig { stride: 2, padding: 1, ..Default::default() }, vb.pp("conv2"))?;
        let head = candle_nn::linear(32, max_detections * 6, vb.pp("head"))?;
        Ok(Self { conv1, conv2, head, max_detections })
    }

    fn forward(&self, input: &Tensor) -> candle_core::Result<Tensor> {
        let x = self.conv1.forward(input)?.relu()?;
        let x = self.conv2.forward(&x)?.relu()?;
        let x = x.mean(3)?.mean(2)?; // global average pool -> [N, C]
        let x = self.head.forward(&x)?;
        x.reshape((self.max_detections, 6))
    }
}

pub struct CandleBackend {
    device: Accelerator,
    candle_device: Device,
    head: DetectorHead,
}

impl CandleBackend {
    pub fn load(
        descriptor: &ModelDescriptor,
        weights_path: &Path,
        device: Accelerator,
    ) -> Result<Self, InferenceError> {
        let candle_device = match device {
            Accelerator::Cpu => Device::Cpu,
            // Candle's CUDA/Metal device construction requires a compiled
            // backend and ordinal; the container's feature set gates which
            // of these is reachable at all (see engine::device).
            Accelerator::Cuda | Accelerator::Metal => Device::Cpu,
        };

        let weights = candle_core::safetensors::load(weights_path, &candle_device)
            .map_err(|e| InferenceError::Backend(format!("failed to load weights: {e}")))?;
        let vb = VarBuilder::from_tensors(weights, DType::F32, &candle_device);

        let max_detections = 256;
        let head = DetectorHead::load(vb, max_detections)
            .map_err(|e| InferenceError::Backend(format!("failed to build model graph: {e}")))?;

        let _ = descriptor;
        Ok(Self { device, candle_device, head })
    }
}

impl ModelBackend for CandleBackend {
    fn infer(&self, input: &PreprocessedInput) -> Result<Vec<RawDetection>, InferenceError> {
        let tensor = Tensor::from_slice(&input.data, &input.shape[..], &self.candle_device)
            .map_err(|e| InferenceError::Backend(format!("failed to build input tensor: {e}")))?;

        let output = self
            .head
            .forward(&tensor)
            .map_err(|e| InferenceError::Backend(format!("forward pass failed: {e}")))?;

        let rows: Vec<Vec<f32>> = output
            .to_vec2()
            .map_err(|e| InferenceError::Backend(format!("failed to read model output: {e}")))?;

        Ok(rows
            .into_iter()
            .filter(|row| row.len() == 6)
            .map(|row| RawDetection {
                class_id: row[5].max(0.0) as u32,
                confidence: row[4],
                bbox: [row[0], row[1], row[2], row[3]],
            })
            .collect())
    }

    fn device(&self) -> Accelerator {
        self.device
    }
}

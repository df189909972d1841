//! Model Runtime (C3): device selection, backend abstraction, and the
//! preprocess/postprocess pipeline stages that bracket the forward pass.

mod backend;
#[cfg(feature = "pytorch-like")]
mod candle_backend;
pub mod device;
pub mod error;
#[cfg(feature = "onnx-like")]
mod onnx_backend;
pub mod postprocess;
pub mod preprocess;
mod runtime;

pub use backend::{load_backend, ModelBackend};
pub use error::InferenceError;
pub use postprocess::RawDetection;
pub use preprocess::PreprocessedInput;
pub use runtime::{InferenceConfig, InferenceEngine};

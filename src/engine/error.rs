//! Error taxonomy for the model container.
//!
//! All errors are fail-closed: invalid inputs are rejected, never truncated
//! or silently coerced. `InferenceError` covers everything that can go
//! wrong downstream of the IPC decode step; protocol-framing errors live in
//! `ipc::protocol` and never reach this type.

use thiserror::Error;

use crate::descriptor::DescriptorError;
use crate::frame::FrameError;

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("model not loaded")]
    ModelNotLoaded,

    #[error("request validation failed: {0}")]
    InputValidation(String),

    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    #[error("descriptor error: {0}")]
    Descriptor(#[from] DescriptorError),

    #[error("no accelerator present and gpu_required is set")]
    AcceleratorRequired,

    #[error("model backend error: {0}")]
    Backend(String),

    #[error("inference timed out after {0}ms")]
    Timeout(u64),

    #[error("output schema mismatch: {0}")]
    InvalidOutputSchema(String),
}

impl InferenceError {
    /// Errors that should surface in request-scoped logs at warn rather
    /// than error level (caller-caused, not a container defect).
    pub fn is_caller_error(&self) -> bool {
        matches!(self, Self::InputValidation(_) | Self::Frame(_))
    }
}

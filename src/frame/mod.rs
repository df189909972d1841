//! Frame Reader (C1): shared-memory frame ingestion.

mod reader;

pub use reader::{expected_nv12_size, read_frame, FrameBytes, FrameError};

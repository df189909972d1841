//! Frame Reader (C1): copies a frame out of externally-owned shared memory.
//!
//! This is the mirror image of the zero-copy `MappedModel` pattern used to
//! load model weights: weights are owned for the process lifetime so the
//! mapping is kept alive, but a frame's shared-memory region is owned by an
//! external writer and must never be retained past a single request. The
//! mapping and its file descriptor are always dropped before this function
//! returns; callers only ever see an owned, private copy.

use std::fs::File;
use std::path::Path;

use memmap2::MmapOptions;
use thiserror::Error;

/// Errors raised while resolving or reading a frame reference.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("shared memory region not found: {0}")]
    MissingRegion(String),

    #[error("permission denied opening shared memory region: {0}")]
    PermissionDenied(String),

    #[error("frame size mismatch: region is {actual} bytes, expected {expected} bytes for {width}x{height} NV12")]
    SizeMismatch { actual: usize, expected: usize, width: u32, height: u32 },

    #[error("unsupported frame reference: {0}")]
    UnsupportedFormat(String),
}

/// An owned, private copy of one frame's pixel bytes. Independent of any
/// shared memory region by construction — there is no lifetime tying this
/// buffer back to the mapping it was copied from.
#[derive(Debug, Clone)]
pub struct FrameBytes {
    data: Vec<u8>,
}

impl FrameBytes {
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// NV12 frame byte size for a given resolution: one full-resolution luma
/// plane plus a half-resolution, 2-plane-interleaved chroma plane.
pub fn expected_nv12_size(width: u32, height: u32) -> usize {
    let w = width as usize;
    let h = height as usize;
    w * h + (w * h) / 2
}

/// Read `width`x`height` NV12 bytes referenced by `frame_reference`.
///
/// `frame_reference` is a filesystem path to the shared-memory-backed
/// region (e.g. a `/dev/shm/...` path or equivalent). The region is mapped
/// read-only, its bytes are copied into an owned buffer, and the mapping is
/// dropped before this function returns — the OS-level mapping and fd never
/// outlive this call.
pub fn read_frame(frame_reference: &str, width: u32, height: u32) -> Result<FrameBytes, FrameError> {
    let path = Path::new(frame_reference);

    let file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => FrameError::MissingRegion(frame_reference.to_string()),
        std::io::ErrorKind::PermissionDenied => {
            FrameError::PermissionDenied(frame_reference.to_string())
        }
        _ => FrameError::MissingRegion(format!("{frame_reference}: {e}")),
    })?;

    // SAFETY: the region is opened read-only and we never write through
    // this mapping; the file is externally owned (written by the video
    // decoder) and may be resized or unlinked concurrently, which is why
    // we copy out immediately rather than holding the mapping.
    let mmap = unsafe { MmapOptions::new().map(&file) }
        .map_err(|e| FrameError::MissingRegion(format!("{frame_reference}: {e}")))?;

    let expected = expected_nv12_size(width, height);
    if mmap.len() != expected {
        return Err(FrameError::SizeMismatch { actual: mmap.len(), expected, width, height });
    }

    let data = mmap.to_vec();
    drop(mmap);
    drop(file);

    Ok(FrameBytes { data })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_region(dir: &Path, name: &str, bytes: &[u8]) -> String {
        let path = dir.join(name);
        let mut f = File::create(&path).unwrap();
        f.write_all(bytes).unwrap();
        path.to_str().unwrap().to_string()
    }

    #[test]
    fn reads_exact_size_frame() {
        let tmp = tempfile::tempdir().unwrap();
        let size = expected_nv12_size(4, 2);
        let data = vec![7u8; size];
        let path = write_region(tmp.path(), "frame.raw", &data);

        let frame = read_frame(&path, 4, 2).unwrap();
        assert_eq!(frame.as_slice(), data.as_slice());
    }

    #[test]
    fn rejects_size_mismatch() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_region(tmp.path(), "frame.raw", &[0u8; 10]);
        let err = read_frame(&path, 4, 2).unwrap_err();
        assert!(matches!(err, FrameError::SizeMismatch { .. }));
    }

    #[test]
    fn missing_region_is_reported() {
        let err = read_frame("/nonexistent/frame/path", 4, 2).unwrap_err();
        assert!(matches!(err, FrameError::MissingRegion(_)));
    }

    #[test]
    fn nv12_size_formula() {
        assert_eq!(expected_nv12_size(640, 480), 640 * 480 + 640 * 480 / 2);
    }
}

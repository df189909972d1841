//! Preprocessor (C2): NV12 -> RGB -> resize -> normalize -> CHW -> batch.

use crate::descriptor::Resolution;
use crate::engine::error::InferenceError;
use crate::frame::FrameBytes;

/// A model-ready tensor: NCHW, f32, batch dimension always 1.
#[derive(Debug, Clone)]
pub struct PreprocessedInput {
    pub data: Vec<f32>,
    pub shape: [usize; 4], // [N, C, H, W]
}

/// BT.601 NV12 -> RGB -> bilinear resize -> [0,1] normalize -> CHW -> batch.
pub fn preprocess(
    frame: &FrameBytes,
    source: Resolution,
    target: Resolution,
) -> Result<PreprocessedInput, InferenceError> {
    let rgb = nv12_to_rgb(frame.as_slice(), source.width, source.height)?;
    let resized = bilinear_resize(&rgb, source.width, source.height, target.width, target.height);
    let chw = to_chw_normalized(&resized, target.width, target.height);

    Ok(PreprocessedInput {
        data: chw,
        shape: [1, 3, target.height as usize, target.width as usize],
    })
}

/// Convert an NV12 buffer to interleaved RGB888 using BT.601 coefficients.
fn nv12_to_rgb(nv12: &[u8], width: u32, height: u32) -> Result<Vec<u8>, InferenceError> {
    let w = width as usize;
    let h = height as usize;
    let y_size = w * h;
    let expected = y_size + y_size / 2;
    if nv12.len() != expected {
        return Err(InferenceError::InputValidation(format!(
            "nv12 buffer is {} bytes, expected {expected} for {width}x{height}",
            nv12.len()
        )));
    }

    let y_plane = &nv12[..y_size];
    let uv_plane = &nv12[y_size..];

    let mut rgb = vec![0u8; y_size * 3];
    for row in 0..h {
        for col in 0..w {
            let y = y_plane[row * w + col] as f32;
            let uv_row = row / 2;
            let uv_col = (col / 2) * 2;
            let u = uv_plane[uv_row * w + uv_col] as f32 - 128.0;
            let v = uv_plane[uv_row * w + uv_col + 1] as f32 - 128.0;

            // BT.601 full-range YUV -> RGB.
            let r = y + 1.402 * v;
            let g = y - 0.344136 * u - 0.714136 * v;
            let b = y + 1.772 * u;

            let idx = (row * w + col) * 3;
            rgb[idx] = r.clamp(0.0, 255.0) as u8;
            rgb[idx + 1] = g.clamp(0.0, 255.0) as u8;
            rgb[idx + 2] = b.clamp(0.0, 255.0) as u8;
        }
    }

    Ok(rgb)
}

/// Bilinear resize of an interleaved RGB888 buffer.
fn bilinear_resize(rgb: &[u8], src_w: u32, src_h: u32, dst_w: u32, dst_h: u32) -> Vec<u8> {
    if src_w == dst_w && src_h == dst_h {
        return rgb.to_vec();
    }

    let (src_w, src_h, dst_w, dst_h) = (src_w as usize, src_h as usize, dst_w as usize, dst_h as usize);
    let mut out = vec![0u8; dst_w * dst_h * 3];

    let x_ratio = src_w as f32 / dst_w as f32;
    let y_ratio = src_h as f32 / dst_h as f32;

    for dy in 0..dst_h {
        let sy = (dy as f32 + 0.5) * y_ratio - 0.5;
        let sy0 = sy.floor().max(0.0) as usize;
        let sy1 = (sy0 + 1).min(src_h - 1);
        let wy = (sy - sy0 as f32).clamp(0.0, 1.0);

        for dx in 0..dst_w {
            let sx = (dx as f32 + 0.5) * x_ratio - 0.5;
            let sx0 = sx.floor().max(0.0) as usize;
            let sx1 = (sx0 + 1).min(src_w - 1);
            let wx = (sx - sx0 as f32).clamp(0.0, 1.0);

            for c in 0..3 {
                let p00 = rgb[(sy0 * src_w + sx0) * 3 + c] as f32;
                let p01 = rgb[(sy0 * src_w + sx1) * 3 + c] as f32;
                let p10 = rgb[(sy1 * src_w + sx0) * 3 + c] as f32;
                let p11 = rgb[(sy1 * src_w + sx1) * 3 + c] as f32;

                let top = p00 * (1.0 - wx) + p01 * wx;
                let bottom = p10 * (1.0 - wx) + p11 * wx;
                let value = top * (1.0 - wy) + bottom * wy;

                out[(dy * dst_w + dx) * 3 + c] = value.round().clamp(0.0, 255.0) as u8;
            }
        }
    }

    out
}

/// Scale to `[0, 1]` and transpose interleaved HWC -> planar CHW.
fn to_chw_normalized(rgb: &[u8], width: u32, height: u32) -> Vec<f32> {
    let w = width as usize;
    let h = height as usize;
    let mut chw = vec![0f32; 3 * w * h];

    for row in 0..h {
        for col in 0..w {
            let hwc_idx = (row * w + col) * 3;
            for c in 0..3 {
                chw[c * w * h + row * w + col] = rgb[hwc_idx + c] as f32 / 255.0;
            }
        }
    }

    chw
}

//! Post-processing: confidence filter, bbox clip/normalize, optional greedy
//! NMS, and a hard cap on detections returned per request.

use serde::{Deserialize, Serialize};

/// A detection as produced by a backend, before thresholding/NMS/clipping.
/// `bbox` is `[x_min, y_min, x_max, y_max]`, normalized to `[0, 1]` against
/// the model's input resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawDetection {
    pub class_id: u32,
    pub confidence: f32,
    pub bbox: [f32; 4],
}

/// Hard cap on detections returned per request, regardless of how many the
/// backend produced before filtering.
pub const MAX_DETECTIONS: usize = 1000;

/// Filter by confidence, clip boxes into `[0, 1]`, optionally run greedy
/// NMS, then cap at `MAX_DETECTIONS` — all while preserving the backend's
/// original ordering among survivors.
pub fn postprocess(
    detections: Vec<RawDetection>,
    confidence_threshold: f32,
    nms_iou_threshold: Option<f32>,
) -> Vec<RawDetection> {
    let mut kept: Vec<RawDetection> = detections
        .into_iter()
        .filter(|d| d.confidence >= confidence_threshold)
        .map(clip_bbox)
        .collect();

    if let Some(iou_threshold) = nms_iou_threshold {
        kept = greedy_nms(kept, iou_threshold);
    }

    kept.truncate(MAX_DETECTIONS);
    kept
}

fn clip_bbox(mut detection: RawDetection) -> RawDetection {
    for v in detection.bbox.iter_mut() {
        *v = v.clamp(0.0, 1.0);
    }
    if detection.bbox[0] > detection.bbox[2] {
        detection.bbox.swap(0, 2);
    }
    if detection.bbox[1] > detection.bbox[3] {
        detection.bbox.swap(1, 3);
    }
    detection
}

/// Greedy non-max suppression, stable with respect to input order for boxes
/// that survive: iterate by descending confidence, suppress later boxes
/// overlapping a kept one above `iou_threshold` within the same class.
fn greedy_nms(detections: Vec<RawDetection>, iou_threshold: f32) -> Vec<RawDetection> {
    let mut order: Vec<usize> = (0..detections.len()).collect();
    order.sort_by(|&a, &b| detections[b].confidence.partial_cmp(&detections[a].confidence).unwrap());

    let mut suppressed = vec![false; detections.len()];
    let mut keep_indices = Vec::new();

    for &i in &order {
        if suppressed[i] {
            continue;
        }
        keep_indices.push(i);
        for &j in &order {
            if j == i || suppressed[j] {
                continue;
            }
            if detections[i].class_id == detections[j].class_id
                && iou(&detections[i].bbox, &detections[j].bbox) > iou_threshold
            {
                suppressed[j] = true;
            }
        }
    }

    keep_indices.sort_unstable();
    keep_indices.into_iter().map(|i| detections[i].clone()).collect()
}

fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    let x_min = a[0].max(b[0]);
    let y_min = a[1].max(b[1]);
    let x_max = a[2].min(b[2]);
    let y_max = a[3].min(b[3]);

    let inter = (x_max - x_min).max(0.0) * (y_max - y_min).max(0.0);
    let area_a = (a[2] - a[0]).max(0.0) * (a[3] - a[1]).max(0.0);
    let area_b = (b[2] - b[0]).max(0.0) * (b[3] - b[1]).max(0.0);
    let union = area_a + area_b - inter;

    if union <= 0.0 {
        0.0
    } else {
        inter / union
    }
}

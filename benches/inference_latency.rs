//! Pipeline-stage benchmarks: descriptor validation and the
//! preprocess/postprocess stages that bracket a model's forward pass.

use std::fs::File;
use std::io::Write;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use vas_model_container::descriptor::{InputFormat, ModelDescriptor, ModelType, Resolution, SupportedTask};
use vas_model_container::engine::postprocess::{postprocess, RawDetection};
use vas_model_container::engine::preprocess::preprocess;
use vas_model_container::frame::read_frame;

fn sample_descriptor() -> ModelDescriptor {
    ModelDescriptor {
        model_id: "vehicle-detector-v1".to_string(),
        model_name: "Vehicle Detector".to_string(),
        model_version: "1.0.0".to_string(),
        supported_tasks: vec![SupportedTask::ObjectDetection],
        input_format: InputFormat::Nv12,
        expected_resolution: Resolution { width: 1920, height: 1080 },
        gpu_required: false,
        gpu_memory_mb: None,
        cpu_fallback_allowed: true,
        model_type: ModelType::OnnxLike,
        model_weights: "model.onnx".into(),
        confidence_threshold: 0.5,
        nms_iou_threshold: Some(0.45),
        output_schema: "detection-v1".to_string(),
    }
}

fn write_nv12_frame(width: u32, height: u32) -> tempfile::TempDir {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("frame.nv12");
    let size = vas_model_container::frame::expected_nv12_size(width, height);
    let mut file = File::create(&path).unwrap();
    file.write_all(&vec![128u8; size]).unwrap();
    tmp
}

fn bench_descriptor_validate(c: &mut Criterion) {
    let descriptor = sample_descriptor();
    c.bench_function("descriptor_validate", |b| {
        b.iter(|| black_box(&descriptor).validate())
    });
}

fn bench_preprocess(c: &mut Criterion) {
    let mut group = c.benchmark_group("preprocess");

    for (name, (w, h)) in [("480p", (640, 480)), ("1080p", (1920, 1080))] {
        let tmp = write_nv12_frame(w, h);
        let path = tmp.path().join("frame.nv12").to_str().unwrap().to_string();
        let frame = read_frame(&path, w, h).unwrap();
        let source = Resolution { width: w, height: h };
        let target = Resolution { width: 416, height: 416 };

        group.bench_with_input(BenchmarkId::new("nv12_to_tensor", name), &frame, |b, frame| {
            b.iter(|| preprocess(black_box(frame), source, target))
        });
    }

    group.finish();
}

fn sample_detections(count: usize) -> Vec<RawDetection> {
    (0..count)
        .map(|i| RawDetection {
            class_id: (i % 10) as u32,
            confidence: 0.3 + (i % 70) as f32 / 100.0,
            bbox: [0.1, 0.1, 0.4, 0.4],
        })
        .collect()
}

fn bench_postprocess(c: &mut Criterion) {
    let mut group = c.benchmark_group("postprocess");

    for count in [10, 100, 1000] {
        group.bench_with_input(BenchmarkId::new("confidence_and_nms", count), &count, |b, &count| {
            b.iter_batched(
                || sample_detections(count),
                |detections| postprocess(black_box(detections), 0.5, Some(0.45)),
                criterion::BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

criterion_group!(benches, bench_descriptor_validate, bench_preprocess, bench_postprocess);
criterion_main!(benches);

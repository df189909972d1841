//! IPC encoding/decoding throughput benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use vas_model_container::ipc::protocol::{
    decode_message, encode_message, FrameMetadata, InferenceRequest, InferenceRequestConfig,
    IpcMessage,
};

fn build_request(detection_count: usize) -> InferenceRequest {
    InferenceRequest {
        frame_reference: "/dev/shm/bench-frame".to_string(),
        frame_metadata: FrameMetadata {
            frame_id: detection_count as i64,
            width: 1920,
            height: 1080,
            format: "NV12".to_string(),
            timestamp: 0.0,
        },
        camera_id: "cam1".to_string(),
        model_id: "vehicle-detector-v1".to_string(),
        timestamp: 0.0,
        config: InferenceRequestConfig::default(),
    }
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_message");

    for (name, count) in [("small", 1), ("medium", 100), ("large", 1000)] {
        let message = IpcMessage::InferenceRequest(build_request(count));

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("requests", name), &message, |b, msg| {
            b.iter(|| encode_message(black_box(msg)))
        });
    }

    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_message");

    for (name, count) in [("small", 1), ("medium", 100), ("large", 1000)] {
        let message = IpcMessage::InferenceRequest(build_request(count));
        let encoded = encode_message(&message).expect("encode failed");

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("requests", name), &encoded, |b, bytes| {
            b.iter(|| decode_message(black_box(bytes)))
        });
    }

    group.finish();
}

fn bench_roundtrip(c: &mut Criterion) {
    let mut group = c.benchmark_group("roundtrip");

    for (name, count) in [("small", 1), ("medium", 100), ("large", 1000)] {
        let message = IpcMessage::InferenceRequest(build_request(count));

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("requests", name), &message, |b, msg| {
            b.iter(|| {
                let encoded = encode_message(black_box(msg)).unwrap();
                decode_message(black_box(&encoded))
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode, bench_roundtrip);
criterion_main!(benches);

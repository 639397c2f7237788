use criterion::{black_box, criterion_group, criterion_main, Criterion};

use mesh_radio::audio::frame::AudioFrame;
use mesh_radio::codec::FrameCodec;

fn codec_benchmark(c: &mut Criterion) {
    let codec = FrameCodec::new(1024);
    let frame = AudioFrame::new(
        (0..1024)
            .map(|i| (i as f32 * 440.0 / 44_100.0).sin())
            .collect(),
    );
    let packet = codec.encode(&frame);

    c.bench_function("encode_1024", |b| {
        b.iter(|| codec.encode(black_box(&frame)))
    });

    c.bench_function("decode_1024", |b| {
        b.iter(|| codec.decode(black_box(&packet[..])).unwrap())
    });
}

criterion_group!(benches, codec_benchmark);
criterion_main!(benches);

//! Single voice and single envelope blocks.

use std::hint::black_box;
use std::sync::Arc;

use criterion::{BenchmarkId, Criterion};
use mesh_raster::{
    graph::CapacitySpec,
    synth::{EnvControlSnapshot, EnvRasterizer, RenderRequest, VoiceRasterizer},
};

use crate::{bench_mesh, BLOCK_SIZES};

pub fn bench_voices(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/voices");
    let mesh = Arc::new(bench_mesh(12));

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // === OSCILLATOR ===
        // A3 at 48kHz, chained curve building every block
        let mut voice = VoiceRasterizer::new(CapacitySpec::for_intercepts(16));
        voice.prepare();
        voice.set_mesh_snapshot(Some(mesh.clone()));
        voice.note_on();
        let request = RenderRequest::new(size, 220.0 / 48_000.0);

        group.bench_with_input(BenchmarkId::new("oscillator", size), &size, |b, _| {
            b.iter(|| voice.render_audio(black_box(&request), black_box(&mut buffer)))
        });

        // === LOOPING ENVELOPE ===
        let mut env = EnvRasterizer::new(CapacitySpec::for_intercepts(16));
        env.prepare();
        env.set_mesh_snapshot(Some(mesh.clone()));
        env.update_control_data(EnvControlSnapshot {
            loop_enabled: true,
            loop_start: 0.25,
            loop_end: 0.75,
            ..EnvControlSnapshot::default()
        });
        env.note_on();
        let request = RenderRequest::new(size, 1.0 / 48_000.0);

        group.bench_with_input(BenchmarkId::new("envelope", size), &size, |b, _| {
            b.iter(|| env.render_audio(black_box(&request), black_box(&mut buffer)))
        });
    }

    group.finish();
}

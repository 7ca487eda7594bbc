//! Full voice pool: every voice rebuilds a wave and an envelope per block.

use std::hint::black_box;
use std::sync::Arc;

use criterion::{BenchmarkId, Criterion};
use mesh_raster::{
    mesh::MeshSource,
    synth::{MeshSynth, MessageReceiver, RasterMessage, SynthConfig},
};

use crate::{bench_mesh, BLOCK_SIZES};

/// Hands out a fixed list of messages once.
struct Script(Vec<RasterMessage>);

impl MessageReceiver for Script {
    fn pop(&mut self) -> Option<RasterMessage> {
        self.0.pop()
    }
}

pub fn bench_synth(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/synth");
    let wave: Arc<dyn MeshSource> = Arc::new(bench_mesh(8));
    let env: Arc<dyn MeshSource> = Arc::new(bench_mesh(4));

    for &voices in &[1usize, 4, 8] {
        for &size in BLOCK_SIZES {
            let notes = (0..voices as u8)
                .map(|i| RasterMessage::NoteOn {
                    note: 48 + 3 * i,
                    velocity: 100,
                })
                .collect();
            let mut synth = MeshSynth::new(
                SynthConfig {
                    max_voices: voices,
                    ..SynthConfig::default()
                },
                Script(notes),
            );
            synth.set_meshes(wave.clone(), env.clone());
            let mut buffer = vec![0.0f32; size];

            let id = BenchmarkId::new(format!("{voices}_voices"), size);
            group.bench_with_input(id, &size, |b, _| {
                b.iter(|| synth.render_block(black_box(&mut buffer)))
            });
        }
    }

    group.finish();
}

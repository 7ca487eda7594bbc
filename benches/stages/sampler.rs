//! Breakpoint walk over an already built wave.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use mesh_raster::graph::{
    sampler::LINEAR_SAMPLER, CurveContext, Graph, GraphContext, InterpolatorContext,
    PaddingPolicy, PositionerContext, Sampler, SamplerContext, Scaling, WaveContext, Workspace,
};
use mesh_raster::mesh::MorphPosition;

use crate::{bench_mesh, BLOCK_SIZES};

pub fn bench_sampler(c: &mut Criterion) {
    let mut group = c.benchmark_group("stages/sampler");

    let mesh = bench_mesh(16);
    let mut ws = Workspace::default();
    ws.prepare();
    let ctx = GraphContext {
        interpolator: InterpolatorContext {
            mesh: Some(&mesh),
            morph: MorphPosition::default(),
            wrap_phases: false,
        },
        positioner: PositionerContext {
            scaling: Scaling::Unipolar,
            min_x: 0.0,
            max_x: 1.0,
        },
        curve: CurveContext {
            padding: PaddingPolicy::Generic,
            cyclic: false,
            min_x: 0.0,
            max_x: 1.0,
            integral_sampling: false,
            low_resolution: false,
        },
        wave: WaveContext::default(),
    };
    let _ = Graph::default().build_wave(&mut ws, &ctx, None);

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // One pass across the whole axis per block
        group.bench_with_input(BenchmarkId::new("sweep", size), &size, |b, &size| {
            b.iter(|| {
                let mut sampler = SamplerContext {
                    phase: 0.0,
                    delta_x: 1.0 / size as f64,
                    cursor: 0,
                };
                LINEAR_SAMPLER.run(ws.wave(), black_box(&mut buffer), &mut sampler)
            })
        });
    }

    group.finish();
}

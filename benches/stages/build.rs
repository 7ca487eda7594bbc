//! Interpolate → position → curves → wave, without sampling.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use mesh_raster::{
    graph::{
        CapacitySpec, CurveContext, Graph, GraphContext, InterpolatorContext, PaddingPolicy,
        PositionerContext, Scaling, WaveContext, Workspace,
    },
    mesh::MorphPosition,
};

use crate::bench_mesh;

pub fn bench_build_wave(c: &mut Criterion) {
    let mut group = c.benchmark_group("stages/build_wave");
    let graph = Graph::default();

    for &points in &[4usize, 16, 64] {
        let mesh = bench_mesh(points);
        let mut ws = Workspace::new(CapacitySpec::for_intercepts(points));
        ws.prepare();

        for (name, low_resolution) in [("full", false), ("low_res", true)] {
            let ctx = GraphContext {
                interpolator: InterpolatorContext {
                    mesh: Some(&mesh),
                    morph: MorphPosition::new(0.3, 0.6, 0.4),
                    wrap_phases: false,
                },
                positioner: PositionerContext {
                    scaling: Scaling::Bipolar,
                    min_x: 0.0,
                    max_x: 1.0,
                },
                curve: CurveContext {
                    padding: PaddingPolicy::Generic,
                    cyclic: false,
                    min_x: 0.0,
                    max_x: 1.0,
                    integral_sampling: false,
                    low_resolution,
                },
                wave: WaveContext::default(),
            };

            group.bench_with_input(BenchmarkId::new(name, points), &points, |b, _| {
                b.iter(|| {
                    let _ = black_box(graph.build_wave(&mut ws, black_box(&ctx), None));
                })
            });
        }
    }

    group.finish();
}

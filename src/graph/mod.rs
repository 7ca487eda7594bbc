//! The staged rasterization pipeline.
//!
//! Each stage is a small stateless trait object. A [`Graph`] borrows one of
//! each and runs them in order over a [`Workspace`]:
//!
//! ```text
//! mesh ─▶ Interpolator ─▶ Positioner ─▶ CurveBuilder ─▶ WaveBuilder ─▶ Sampler ─▶ samples
//!          intercepts      intercepts     curves          x/y/slope
//! ```
//!
//! Swapping a stage (linear vs cyclic positioning, a different
//! interpolator) is a reference assignment between render calls. Nothing
//! is reallocated.

/// Padding and curve piece construction.
pub mod curve_builder;
/// Intercept extraction from the mesh.
pub mod interpolator;
/// Stage traits and the per-stage contexts.
pub mod node;
/// Scaling, wrapping and ordering of intercepts.
pub mod positioner;
/// Breakpoint walk producing audio samples.
pub mod sampler;
/// Curve pieces flattened into breakpoint arrays.
pub mod wave_builder;
/// Preallocated buffers for one rasterizer.
pub mod workspace;

pub use curve_builder::ChainState;
pub use interpolator::InterpolationMode;
pub use node::{
    CurveBuilder, CurveContext, Interpolator, InterpolatorContext, PaddingPolicy, Positioner,
    PositionerContext, Sampler, SamplerContext, Scaling, WaveBuilder, WaveContext,
};
pub use wave_builder::WaveShape;
pub use workspace::{CapacitySpec, DeformRegion, WaveView, Workspace};

use crate::{error::RenderError, synth::control::RenderResult};

/// Contexts for one wave build.
#[derive(Clone, Copy)]
pub struct GraphContext<'a> {
    pub interpolator: InterpolatorContext<'a>,
    pub positioner: PositionerContext,
    pub curve: CurveContext,
    pub wave: WaveContext,
}

/// One stage of each kind, wired in order.
#[derive(Clone, Copy)]
pub struct Graph<'a> {
    interpolator: &'a dyn Interpolator,
    positioner: &'a dyn Positioner,
    curve_builder: &'a dyn CurveBuilder,
    wave_builder: &'a dyn WaveBuilder,
    sampler: &'a dyn Sampler,
}

impl<'a> Graph<'a> {
    pub fn new(
        interpolator: &'a dyn Interpolator,
        positioner: &'a dyn Positioner,
        curve_builder: &'a dyn CurveBuilder,
        wave_builder: &'a dyn WaveBuilder,
        sampler: &'a dyn Sampler,
    ) -> Self {
        Self {
            interpolator,
            positioner,
            curve_builder,
            wave_builder,
            sampler,
        }
    }

    pub fn set_interpolator(&mut self, stage: &'a dyn Interpolator) {
        self.interpolator = stage;
    }

    pub fn set_positioner(&mut self, stage: &'a dyn Positioner) {
        self.positioner = stage;
    }

    pub fn set_curve_builder(&mut self, stage: &'a dyn CurveBuilder) {
        self.curve_builder = stage;
    }

    pub fn set_wave_builder(&mut self, stage: &'a dyn WaveBuilder) {
        self.wave_builder = stage;
    }

    pub fn set_sampler(&mut self, stage: &'a dyn Sampler) {
        self.sampler = stage;
    }

    /// Run every stage up to the wave builder, leaving the breakpoints in
    /// `ws`. On failure the workspace is left reset.
    pub fn build_wave(
        &self,
        ws: &mut Workspace,
        ctx: &GraphContext<'_>,
        chain: Option<&mut ChainState>,
    ) -> Result<WaveShape, RenderError> {
        if !ws.is_prepared() {
            return Err(RenderError::WorkspaceNotPrepared);
        }
        ws.reset();

        let result = self.run_stages(ws, ctx, chain);
        if result.is_err() {
            ws.reset();
        }
        result
    }

    fn run_stages(
        &self,
        ws: &mut Workspace,
        ctx: &GraphContext<'_>,
        chain: Option<&mut ChainState>,
    ) -> Result<WaveShape, RenderError> {
        let extracted = self.interpolator.run(&ctx.interpolator, &mut ws.intercepts)?;
        if extracted == 0 {
            return Err(RenderError::NoIntercepts);
        }

        let count = self
            .positioner
            .run(&mut ws.intercepts[..extracted], &ctx.positioner)?;
        ws.num_intercepts = count;

        let curves = self.curve_builder.run(
            &ws.intercepts[..count],
            &mut ws.padded,
            &mut ws.curves,
            &ctx.curve,
            chain,
        )?;
        ws.num_curves = curves;

        let max_wave_points = ws.capacity().max_wave_points;
        let shape = self.wave_builder.run(
            &ws.curves[..curves],
            workspace::split_wave(&mut ws.wave, max_wave_points),
            &mut ws.regions,
            &ctx.wave,
        )?;
        ws.num_wave_points = shape.count;
        ws.num_regions = shape.num_regions;
        ws.zero_index = shape.zero_index;
        ws.one_index = shape.one_index;
        Ok(shape)
    }

    /// Sample the wave currently held by `ws`.
    pub fn sample(
        &self,
        ws: &Workspace,
        output: &mut [f32],
        ctx: &mut SamplerContext,
    ) -> RenderResult {
        self.sampler.run(ws.wave(), output, ctx)
    }

    /// Build and sample in one go, for stateless callers.
    pub fn render(
        &self,
        ws: &mut Workspace,
        ctx: &GraphContext<'_>,
        output: &mut [f32],
        sampler: &mut SamplerContext,
    ) -> Result<RenderResult, RenderError> {
        if output.is_empty() {
            return Err(RenderError::EmptyOutput);
        }
        self.build_wave(ws, ctx, None)?;
        Ok(self.sample(ws, output, sampler))
    }
}

impl Default for Graph<'static> {
    /// Trilinear, linear positioning, Generic padding, blended wave, linear sampling.
    fn default() -> Self {
        Self::new(
            &interpolator::TRILINEAR,
            &positioner::LINEAR,
            &curve_builder::PADDED,
            &wave_builder::BLENDING,
            &sampler::LINEAR_SAMPLER,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{dsp::Intercept, mesh::Mesh, mesh::MorphPosition};

    fn context(mesh: &Mesh) -> GraphContext<'_> {
        GraphContext {
            interpolator: InterpolatorContext {
                mesh: Some(mesh),
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
        }
    }

    fn triangle() -> Mesh {
        Mesh::from_points(&[(0.0, 0.0, 0.0), (0.5, 1.0, 1.0), (1.0, 0.0, 0.0)])
    }

    #[test]
    fn unprepared_workspace_is_rejected() {
        let mesh = triangle();
        let mut ws = Workspace::default();
        let err = Graph::default()
            .build_wave(&mut ws, &context(&mesh), None)
            .unwrap_err();
        assert_eq!(err, RenderError::WorkspaceNotPrepared);
    }

    #[test]
    fn builds_padded_curves_and_a_sorted_wave() {
        let mesh = triangle();
        let mut ws = Workspace::default();
        assert!(ws.prepare());

        let shape = Graph::default()
            .build_wave(&mut ws, &context(&mesh), None)
            .unwrap();

        assert_eq!(ws.intercepts().len(), 3);
        assert_eq!(ws.curves().len(), 3 + 6);
        assert_eq!(shape.count, ws.num_wave_points());
        let wave = ws.wave();
        assert!(wave.x.windows(2).all(|w| w[0] <= w[1]));
        assert!(wave.x[0] <= 0.0 && wave.x[wave.len() - 1] >= 1.0);
    }

    #[test]
    fn render_samples_the_built_wave() {
        let mesh = triangle();
        let mut ws = Workspace::default();
        ws.prepare();

        let mut out = [0.0; 64];
        let mut sampler = SamplerContext {
            phase: 0.0,
            delta_x: 1.0 / 64.0,
            cursor: 0,
        };
        let result = Graph::default()
            .render(&mut ws, &context(&mesh), &mut out, &mut sampler)
            .unwrap();

        assert!(result.rendered);
        assert_eq!(result.samples_written, 64);
        assert!(out.iter().all(|s| (-0.01..=1.01).contains(s)));
        assert!(out[32] > 0.9);
    }

    struct Stub;

    impl Interpolator for Stub {
        fn run(
            &self,
            _ctx: &InterpolatorContext<'_>,
            out: &mut [Intercept],
        ) -> Result<usize, RenderError> {
            out[0] = Intercept::new(0.75, 0.8);
            out[1] = Intercept::new(-0.25, 0.2);
            Ok(2)
        }
    }

    #[test]
    fn stages_swap_without_rebuilding_the_graph() {
        static STUB: Stub = Stub;
        let mut ws = Workspace::default();
        ws.prepare();

        let mut graph = Graph::default();
        graph.set_interpolator(&STUB);
        let mesh = triangle();
        let mut ctx = context(&mesh);
        ctx.interpolator.mesh = None;
        graph.build_wave(&mut ws, &ctx, None).unwrap();

        let xs: Vec<f32> = ws.intercepts().iter().map(|i| i.x).collect();
        assert!(xs[0] < xs[1]);
        assert!(xs.iter().all(|x| (0.0..=1.0).contains(x)));
        assert_eq!(ws.curves().len(), 2 + 6);
    }

    #[test]
    fn empty_mesh_leaves_nothing_to_render() {
        let mesh = Mesh::new();
        let mut ws = Workspace::default();
        ws.prepare();
        let err = Graph::default()
            .build_wave(&mut ws, &context(&mesh), None)
            .unwrap_err();
        assert_eq!(err, RenderError::NoIntercepts);
        assert_eq!(ws.num_wave_points(), 0);
    }
}

use std::sync::Arc;

use crate::{
    dsp::{CurvePiece, Intercept},
    error::RenderError,
    graph::{
        curve_builder, positioner,
        sampler::{self, LinearSampler},
        wave_builder, CapacitySpec, DeformRegion, Graph, GraphContext, Interpolator, WaveView,
        Workspace,
    },
    mesh::MeshSource,
};

use super::{
    binding::MeshBinding,
    control::{ControlSnapshot, GraphicRequest, GraphicResult},
};

/*
Graphic Rasterizer
==================

Builds the same wave the audio front-ends play and samples it at evenly
spaced positions for drawing. It also keeps the intermediate products
around so an editor can draw them directly:

    intercepts()   the positioned control points
    curves()       one piece per padded point
    wave()         the flattened breakpoints
    regions()      which cube produced each span of breakpoints

Runs on a UI thread; there is no phase to carry between calls.
*/

pub struct GraphicRasterizer {
    controls: ControlSnapshot,
    binding: MeshBinding,
    workspace: Workspace,
}

impl GraphicRasterizer {
    pub fn new(capacity: CapacitySpec) -> Self {
        Self {
            controls: ControlSnapshot::default(),
            binding: MeshBinding::default(),
            workspace: Workspace::new(capacity),
        }
    }

    pub fn prepare(&mut self) -> bool {
        self.workspace.prepare()
    }

    pub fn set_mesh_snapshot(&mut self, mesh: Option<Arc<dyn MeshSource>>) {
        self.binding.set_mesh(mesh);
    }

    pub fn set_substitute_interpolator(&mut self, interpolator: Option<Box<dyn Interpolator>>) {
        self.binding.set_substitute(interpolator);
    }

    pub fn update_control_data(&mut self, controls: ControlSnapshot) {
        self.controls = controls;
    }

    pub fn controls(&self) -> &ControlSnapshot {
        &self.controls
    }

    pub fn intercepts(&self) -> &[Intercept] {
        self.workspace.intercepts()
    }

    pub fn curves(&self) -> &[CurvePiece] {
        self.workspace.curves()
    }

    pub fn wave(&self) -> WaveView<'_> {
        self.workspace.wave()
    }

    pub fn regions(&self) -> &[DeformRegion] {
        self.workspace.regions()
    }

    /// Fill `output[..request.num_points]` with the curve across the
    /// request's interval.
    pub fn render_graphic(&mut self, request: &GraphicRequest, output: &mut [f32]) -> GraphicResult {
        match self.try_render(request, output) {
            Ok(result) => result,
            Err(err) => {
                log::trace!("graphic render skipped: {err}");
                output.fill(0.0);
                GraphicResult::default()
            }
        }
    }

    fn try_render(
        &mut self,
        request: &GraphicRequest,
        output: &mut [f32],
    ) -> Result<GraphicResult, RenderError> {
        request.validate(output.len())?;
        if !self.binding.has_source() {
            return Err(RenderError::MissingMesh);
        }
        let controls = &self.controls;
        if !controls.bounds_valid() {
            return Err(RenderError::InvalidBounds);
        }

        let graph = Graph::new(
            self.binding.interpolator(controls.interpolation)?,
            positioner::for_mode(controls.cyclic),
            &curve_builder::PADDED,
            &wave_builder::BLENDING,
            &sampler::LINEAR_SAMPLER,
        );
        let ctx = GraphContext {
            interpolator: controls.interpolator_context(self.binding.mesh()),
            positioner: controls.positioner_context(),
            curve: controls.curve_context(),
            wave: controls.wave_context(),
        };
        let shape = graph.build_wave(&mut self.workspace, &ctx, None)?;

        let wave = self.workspace.wave();
        let start = request.start_x as f64;
        let step = request.step();
        let mut cursor = 0;
        for (i, point) in output[..request.num_points].iter_mut().enumerate() {
            *point = LinearSampler::sample_at(&wave, start + step * i as f64, &mut cursor);
        }

        Ok(GraphicResult {
            rendered: true,
            points_written: request.num_points,
            zero_index: shape.zero_index,
            one_index: shape.one_index,
            num_wave_points: shape.count,
            num_regions: shape.num_regions,
        })
    }
}

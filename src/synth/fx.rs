use std::sync::Arc;

use crate::{
    error::RenderError,
    graph::{
        curve_builder, positioner, sampler, wave_builder, CapacitySpec, Graph, GraphContext,
        Interpolator, PaddingPolicy, SamplerContext, Workspace,
    },
    mesh::MeshSource,
};

use super::{
    binding::MeshBinding,
    control::{ControlSnapshot, RenderRequest, RenderResult},
};

/// One-shot renders of effect curves (waveshapers, impulse shapes).
///
/// Nothing carries over between calls: the wave is rebuilt and sampled from
/// phase zero every time. Defaults to the fixed legacy padding effect
/// meshes were authored against.
pub struct FxRasterizer {
    controls: ControlSnapshot,
    binding: MeshBinding,
    workspace: Workspace,
}

impl FxRasterizer {
    pub fn new(capacity: CapacitySpec) -> Self {
        Self {
            controls: ControlSnapshot {
                padding: PaddingPolicy::FxLegacyFixed,
                ..ControlSnapshot::default()
            },
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

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn render_audio(&mut self, request: &RenderRequest, output: &mut [f32]) -> RenderResult {
        match self.try_render(request, output) {
            Ok(result) => result,
            Err(_) => {
                output.fill(0.0);
                RenderResult::failed()
            }
        }
    }

    fn try_render(
        &mut self,
        request: &RenderRequest,
        output: &mut [f32],
    ) -> Result<RenderResult, RenderError> {
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

        let output = &mut output[..request.num_samples];
        let mut cursor = SamplerContext {
            phase: 0.0,
            delta_x: request.effective_delta(),
            cursor: 0,
        };
        let mut result = graph.render(&mut self.workspace, &ctx, output, &mut cursor)?;
        for sample in output.iter_mut() {
            *sample = request.shape(*sample);
        }
        result.still_active = false;
        Ok(result)
    }
}

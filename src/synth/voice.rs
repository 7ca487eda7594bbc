use std::sync::Arc;

use crate::{
    error::RenderError,
    graph::{
        curve_builder, positioner,
        sampler::{self, LinearSampler},
        wave_builder, CapacitySpec, ChainState, Graph, GraphContext, Interpolator, WaveView,
        Workspace,
    },
    mesh::MeshSource,
    MAX_UNISON,
};

use super::{
    binding::MeshBinding,
    control::{ControlSnapshot, RenderRequest, RenderResult},
    wrap_phase,
};

/*
Voice Rasterizer
================

Plays a mesh as a single-cycle wavetable. The cycle is not taken from the
controls: it runs between the breakpoints the wave builder anchored nearest
`min_x` and `max_x`, so the seam sits exactly on a breakpoint. A cycle
narrower than 1e-9 falls back to `[min_x, max_x]`.

Each unison index keeps its own phase and cursor, so detuned copies of the
same voice can be rendered block by block without disturbing one another.

Curve building goes through the voice-chaining builder. Its `ChainState`
lives here, next to the phases, and is reset whenever the bound mesh or the
cyclic flag changes.
*/

/// Smallest cycle width before the axis bounds are used instead.
const MIN_CYCLE: f64 = 1e-9;

/// Per-unison playback position.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PhaseContinuation {
    pub phase: f64,
    pub cursor: usize,
}

pub struct VoiceRasterizer {
    controls: ControlSnapshot,
    binding: MeshBinding,
    workspace: Workspace,
    chain: ChainState,
    phases: [PhaseContinuation; MAX_UNISON],
    cycle: (f64, f64),
}

impl VoiceRasterizer {
    pub fn new(capacity: CapacitySpec) -> Self {
        Self {
            controls: ControlSnapshot::cyclic(),
            binding: MeshBinding::default(),
            workspace: Workspace::new(capacity),
            chain: ChainState::new(),
            phases: [PhaseContinuation::default(); MAX_UNISON],
            cycle: (0.0, 1.0),
        }
    }

    /// Allocate the workspace. Not realtime safe.
    pub fn prepare(&mut self) -> bool {
        let prepared = self.workspace.prepare();
        if prepared {
            log::debug!("voice rasterizer ready ({} unison slots)", MAX_UNISON);
        }
        prepared
    }

    pub fn set_capacity(&mut self, capacity: CapacitySpec) {
        self.workspace.set_capacity(capacity);
    }

    /// Bind a mesh. A different mesh breaks curve continuity, so the chain
    /// starts over.
    pub fn set_mesh_snapshot(&mut self, mesh: Option<Arc<dyn MeshSource>>) {
        if self.binding.set_mesh(mesh) {
            self.chain.reset();
        }
    }

    pub fn set_substitute_interpolator(&mut self, interpolator: Option<Box<dyn Interpolator>>) {
        self.binding.set_substitute(interpolator);
        self.chain.reset();
    }

    pub fn update_control_data(&mut self, controls: ControlSnapshot) {
        if controls.cyclic != self.controls.cyclic {
            self.chain.reset();
        }
        self.controls = controls;
    }

    pub fn controls(&self) -> &ControlSnapshot {
        &self.controls
    }

    /// Restart every unison phase at the cycle start and forget the chain.
    pub fn note_on(&mut self) {
        let start = self.controls.min_x as f64;
        for continuation in &mut self.phases {
            *continuation = PhaseContinuation {
                phase: start,
                cursor: 0,
            };
        }
        self.chain.reset();
    }

    /// Offset one unison copy, e.g. to spread detuned voices.
    pub fn set_phase(&mut self, unison_index: usize, phase: f64) {
        if let Some(continuation) = self.phases.get_mut(unison_index) {
            continuation.phase = phase;
        }
    }

    pub fn phase(&self, unison_index: usize) -> Option<f64> {
        self.phases.get(unison_index).map(|c| c.phase)
    }

    /// Cycle bounds derived by the last render.
    pub fn cycle(&self) -> (f64, f64) {
        self.cycle
    }

    pub fn chain(&self) -> &ChainState {
        &self.chain
    }

    pub fn wave(&self) -> WaveView<'_> {
        self.workspace.wave()
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
        if !self.workspace.is_prepared() {
            return Err(RenderError::WorkspaceNotPrepared);
        }
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
            &curve_builder::VOICE_CHAINING,
            &wave_builder::BLENDING,
            &sampler::LINEAR_SAMPLER,
        );
        let ctx = GraphContext {
            interpolator: controls.interpolator_context(self.binding.mesh()),
            positioner: controls.positioner_context(),
            curve: controls.curve_context(),
            wave: controls.wave_context(),
        };
        graph.build_wave(&mut self.workspace, &ctx, Some(&mut self.chain))?;

        let wave = self.workspace.wave();
        let (start, end) = cycle_bounds(
            &wave,
            self.workspace.zero_index(),
            self.workspace.one_index(),
            controls.min_x as f64,
            controls.max_x as f64,
        );
        self.cycle = (start, end);

        let delta = request.effective_delta();
        let continuation = &mut self.phases[request.unison_index];
        let mut phase = continuation.phase;

        for sample in output[..request.num_samples].iter_mut() {
            phase = wrap_phase(phase, start, end);
            let y = LinearSampler::sample_at(&wave, phase, &mut continuation.cursor);
            *sample = request.shape(y);
            phase += delta;
        }
        continuation.phase = wrap_phase(phase, start, end);

        Ok(RenderResult {
            rendered: true,
            still_active: true,
            samples_written: request.num_samples,
        })
    }
}

/// Cycle between the anchored breakpoints, or the axis bounds when that
/// span is degenerate.
pub(crate) fn cycle_bounds(
    wave: &WaveView<'_>,
    zero_index: usize,
    one_index: usize,
    min_x: f64,
    max_x: f64,
) -> (f64, f64) {
    if zero_index < wave.len() && one_index < wave.len() {
        let start = wave.x[zero_index] as f64;
        let end = wave.x[one_index] as f64;
        if end - start > MIN_CYCLE {
            return (start, end);
        }
    }
    (min_x, max_x)
}

use std::sync::Arc;

use crate::{
    dsp::{EnvMode, EnvStateMachine},
    error::RenderError,
    graph::{
        curve_builder, positioner,
        sampler::{self, LinearSampler},
        wave_builder, CapacitySpec, Graph, GraphContext, Interpolator, WaveView, Workspace,
    },
    mesh::MeshSource,
};

use super::{
    binding::MeshBinding,
    control::{EnvControlSnapshot, RenderRequest, RenderResult},
    wrap_phase,
};

/*
Envelope Rasterizer
===================

Plays a mesh as an envelope: the phase starts at `min_x` on note-on and
runs forward once per sample. Three things can bend that path:

    Normal     phase passes loop_end  → machine enters Looping
    Looping    phase wraps inside [loop_start, loop_end)
    note_off   release pending        → phase jumps to release_start_x

The jump to the release section is the one discontinuity an envelope
accepts; it lines up with the release curve's own step.

Phase and cursor persist between blocks. The wave itself is rebuilt every
block so morph and control changes are heard immediately.
*/

pub struct EnvRasterizer {
    machine: EnvStateMachine,
    controls: EnvControlSnapshot,
    binding: MeshBinding,
    workspace: Workspace,
    sample_position: f64,
    sample_index: usize,
}

impl EnvRasterizer {
    /// Create an envelope with an unprepared workspace.
    pub fn new(capacity: CapacitySpec) -> Self {
        Self {
            machine: EnvStateMachine::new(),
            controls: EnvControlSnapshot::default(),
            binding: MeshBinding::default(),
            workspace: Workspace::new(capacity),
            sample_position: 0.0,
            sample_index: 0,
        }
    }

    /// Allocate the workspace. Not realtime safe.
    pub fn prepare(&mut self) -> bool {
        let prepared = self.workspace.prepare();
        if prepared {
            log::debug!("envelope rasterizer ready");
        }
        prepared
    }

    pub fn set_capacity(&mut self, capacity: CapacitySpec) {
        self.workspace.set_capacity(capacity);
    }

    pub fn set_mesh_snapshot(&mut self, mesh: Option<Arc<dyn MeshSource>>) {
        self.binding.set_mesh(mesh);
    }

    /// Replace mesh interpolation with a fixed source of intercepts.
    pub fn set_substitute_interpolator(&mut self, interpolator: Option<Box<dyn Interpolator>>) {
        self.binding.set_substitute(interpolator);
    }

    pub fn update_control_data(&mut self, controls: EnvControlSnapshot) {
        self.controls = controls;
    }

    pub fn controls(&self) -> &EnvControlSnapshot {
        &self.controls
    }

    pub fn note_on(&mut self) {
        self.machine.note_on();
        self.sample_position = self.controls.base.min_x as f64;
        self.sample_index = 0;
    }

    /// Returns false when nothing changed: already releasing, or no
    /// release curve to jump to.
    pub fn note_off(&mut self) -> bool {
        self.machine.note_off(self.controls.has_release_curve)
    }

    pub fn mode(&self) -> EnvMode {
        self.machine.mode()
    }

    pub fn sample_position(&self) -> f64 {
        self.sample_position
    }

    /// Breakpoints from the last successful render.
    pub fn wave(&self) -> WaveView<'_> {
        self.workspace.wave()
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Fill `output[..request.num_samples]`. On failure the output is
    /// silenced and a failed result returned.
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

        let base = &self.controls.base;
        if !base.bounds_valid() {
            return Err(RenderError::InvalidBounds);
        }
        let graph = Graph::new(
            self.binding.interpolator(base.interpolation)?,
            positioner::for_mode(base.cyclic),
            &curve_builder::PADDED,
            &wave_builder::BLENDING,
            &sampler::LINEAR_SAMPLER,
        );
        let ctx = GraphContext {
            interpolator: base.interpolator_context(self.binding.mesh()),
            positioner: base.positioner_context(),
            curve: base.curve_context(),
            wave: base.wave_context(),
        };
        graph.build_wave(&mut self.workspace, &ctx, None)?;

        if self.machine.consume_release_trigger() && self.controls.has_release_curve {
            self.sample_position = self.controls.release_start_x as f64;
            self.sample_index = 0;
        }

        let wave = self.workspace.wave();
        let looped = self.controls.has_loop_region();
        let loop_start = self.controls.loop_start as f64;
        let loop_end = self.controls.loop_end as f64;
        let delta = request.effective_delta();
        let mut phase = self.sample_position;

        for sample in output[..request.num_samples].iter_mut() {
            if looped && self.machine.mode() == EnvMode::Looping {
                phase = wrap_phase(phase, loop_start, loop_end);
            }

            let y = LinearSampler::sample_at(&wave, phase, &mut self.sample_index);
            *sample = request.shape(y);
            phase += delta;

            if looped && self.machine.mode() == EnvMode::Normal && phase >= loop_end {
                self.machine.transition_to_looping(true, true);
            }
            if looped && self.machine.mode() == EnvMode::Looping {
                phase = wrap_phase(phase, loop_start, loop_end);
            }
        }
        self.sample_position = phase;

        let finished = self.machine.mode() == EnvMode::Releasing && phase >= base.max_x as f64;
        Ok(RenderResult {
            rendered: true,
            still_active: !finished,
            samples_written: request.num_samples,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::Mesh;

    fn ramp() -> EnvRasterizer {
        let mut env = EnvRasterizer::new(CapacitySpec::for_intercepts(16));
        assert!(env.prepare());
        env.set_mesh_snapshot(Some(Arc::new(Mesh::from_points(&[
            (0.0, 0.0, 0.0),
            (1.0, 1.0, 0.0),
        ]))));
        env
    }

    #[test]
    fn fails_silently_without_a_mesh() {
        let mut env = EnvRasterizer::new(CapacitySpec::for_intercepts(16));
        env.prepare();
        let mut out = [1.0; 32];
        let result = env.render_audio(&RenderRequest::new(32, 0.01), &mut out);
        assert_eq!(result, RenderResult::failed());
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn fails_when_unprepared() {
        let mut env = EnvRasterizer::new(CapacitySpec::for_intercepts(16));
        env.set_mesh_snapshot(Some(Arc::new(Mesh::from_points(&[(0.5, 0.5, 0.0)]))));
        let mut out = [0.0; 8];
        assert!(!env.render_audio(&RenderRequest::new(8, 0.01), &mut out).rendered);
    }

    #[test]
    fn plays_forward_from_the_start() {
        let mut env = ramp();
        env.note_on();

        let mut out = [0.0; 64];
        let result = env.render_audio(&RenderRequest::new(64, 1.0 / 128.0), &mut out);

        assert!(result.rendered && result.still_active);
        assert_eq!(result.samples_written, 64);
        assert!(out[0] < 0.15);
        assert!(out[63] > out[0]);
        assert!((env.sample_position() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn loops_once_the_loop_end_is_passed() {
        let mut env = ramp();
        env.update_control_data(EnvControlSnapshot {
            loop_enabled: true,
            loop_start: 0.25,
            loop_end: 0.5,
            ..Default::default()
        });
        env.note_on();

        let mut out = [0.0; 100];
        env.render_audio(&RenderRequest::new(100, 0.01), &mut out);

        assert_eq!(env.mode(), EnvMode::Looping);
        assert!((0.25..0.5).contains(&env.sample_position()));
    }

    #[test]
    fn release_jumps_then_finishes() {
        let mut env = ramp();
        env.update_control_data(EnvControlSnapshot {
            has_release_curve: true,
            release_start_x: 0.8,
            ..Default::default()
        });
        env.note_on();

        let mut out = [0.0; 16];
        env.render_audio(&RenderRequest::new(16, 0.01), &mut out);
        assert!(env.note_off());
        assert!(!env.note_off());

        let result = env.render_audio(&RenderRequest::new(16, 0.01), &mut out);
        assert!(out[0] > 0.6);
        assert!(result.still_active);

        let result = env.render_audio(&RenderRequest::new(16, 0.01), &mut out);
        assert!(!result.still_active);
    }

    #[test]
    fn note_off_without_release_curve_is_ignored() {
        let mut env = ramp();
        env.note_on();
        assert!(!env.note_off());
        assert_eq!(env.mode(), EnvMode::Normal);
    }
}

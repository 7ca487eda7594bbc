#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    error::RenderError,
    graph::{
        CurveContext, InterpolationMode, InterpolatorContext, PaddingPolicy, PositionerContext,
        Scaling, WaveContext,
    },
    mesh::{MeshSource, MorphPosition},
    MAX_UNISON,
};

/*
Control Snapshots
=================

The editing layer owns every user-facing parameter. Whenever one changes it
copies a fresh snapshot into the rasterizer with `update_control_data`; the
audio side only ever reads its own copy, so nothing here is shared or
locked.

    ControlSnapshot        axis bounds, scaling, interpolation and
                           resolution flags, morph position
    EnvControlSnapshot     ControlSnapshot + loop region + release info
    RenderRequest          per-block playback parameters
    RenderResult           what a render call produced

A snapshot change takes effect on the next render call.
*/

/// Parameters shared by every rasterizer mode.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlSnapshot {
    pub scaling: Scaling,
    /// Wrap x around `[min_x, max_x)` instead of clamping.
    pub cyclic: bool,
    pub min_x: f32,
    pub max_x: f32,
    pub interpolation: InterpolationMode,
    pub wrap_phases: bool,
    pub integral_sampling: bool,
    pub low_resolution: bool,
    pub padding: PaddingPolicy,
    pub morph: MorphPosition,
}

impl Default for ControlSnapshot {
    fn default() -> Self {
        Self {
            scaling: Scaling::Unipolar,
            cyclic: false,
            min_x: 0.0,
            max_x: 1.0,
            interpolation: InterpolationMode::Trilinear,
            wrap_phases: false,
            integral_sampling: false,
            low_resolution: false,
            padding: PaddingPolicy::Generic,
            morph: MorphPosition::default(),
        }
    }
}

impl ControlSnapshot {
    /// Unit axis with wraparound, as oscillator voices use it.
    pub fn cyclic() -> Self {
        Self {
            cyclic: true,
            scaling: Scaling::Bipolar,
            wrap_phases: true,
            ..Self::default()
        }
    }

    pub fn bounds_valid(&self) -> bool {
        self.min_x.is_finite() && self.max_x.is_finite() && self.max_x > self.min_x
    }

    pub fn interpolator_context<'a>(
        &self,
        mesh: Option<&'a dyn MeshSource>,
    ) -> InterpolatorContext<'a> {
        InterpolatorContext {
            mesh,
            morph: self.morph.clamped(),
            wrap_phases: self.wrap_phases,
        }
    }

    pub fn positioner_context(&self) -> PositionerContext {
        PositionerContext {
            scaling: self.scaling,
            min_x: self.min_x,
            max_x: self.max_x,
        }
    }

    pub fn curve_context(&self) -> CurveContext {
        CurveContext {
            padding: self.padding,
            cyclic: self.cyclic,
            min_x: self.min_x,
            max_x: self.max_x,
            integral_sampling: self.integral_sampling,
            low_resolution: self.low_resolution,
        }
    }

    /// Anchors at the axis bounds.
    pub fn wave_context(&self) -> WaveContext {
        WaveContext {
            anchor_start: self.min_x,
            anchor_end: self.max_x,
        }
    }
}

/// Envelope parameters on top of the shared controls.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvControlSnapshot {
    pub base: ControlSnapshot,
    pub loop_enabled: bool,
    pub loop_start: f32,
    pub loop_end: f32,
    /// Whether the mesh carries a release section to jump to on note-off.
    pub has_release_curve: bool,
    /// Phase the release section starts at.
    pub release_start_x: f32,
}

impl Default for EnvControlSnapshot {
    fn default() -> Self {
        Self {
            base: ControlSnapshot::default(),
            loop_enabled: false,
            loop_start: 0.0,
            loop_end: 0.0,
            has_release_curve: false,
            release_start_x: 0.0,
        }
    }
}

impl EnvControlSnapshot {
    /// Smallest loop width that still counts as a region.
    pub const MIN_LOOP_WIDTH: f64 = 1e-6;

    pub fn has_loop_region(&self) -> bool {
        self.loop_enabled
            && self.loop_start.is_finite()
            && self.loop_end.is_finite()
            && (self.loop_end as f64) > self.loop_start as f64 + Self::MIN_LOOP_WIDTH
    }
}

/// Per-block playback parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderRequest {
    pub num_samples: usize,
    /// Phase advance per sample, in axis units.
    pub delta_x: f64,
    pub tempo_scale: f64,
    /// Output gain.
    pub scale: f32,
    pub unison_index: usize,
    pub tempo_sync: bool,
    pub logarithmic: bool,
}

impl Default for RenderRequest {
    fn default() -> Self {
        Self {
            num_samples: 0,
            delta_x: 0.0,
            tempo_scale: 1.0,
            scale: 1.0,
            unison_index: 0,
            tempo_sync: false,
            logarithmic: false,
        }
    }
}

impl RenderRequest {
    pub fn new(num_samples: usize, delta_x: f64) -> Self {
        Self {
            num_samples,
            delta_x,
            ..Self::default()
        }
    }

    /// Check the numeric fields against an output buffer of `output_len`.
    pub fn validate(&self, output_len: usize) -> Result<(), RenderError> {
        if output_len == 0 {
            return Err(RenderError::EmptyOutput);
        }
        let valid = self.num_samples > 0
            && self.num_samples <= output_len
            && self.delta_x.is_finite()
            && self.delta_x >= 0.0
            && self.tempo_scale.is_finite()
            && self.tempo_scale > 0.0
            && self.scale.is_finite()
            && self.unison_index < MAX_UNISON;
        if valid {
            Ok(())
        } else {
            Err(RenderError::InvalidRequest)
        }
    }

    /// Phase advance per sample after tempo sync.
    #[inline]
    pub fn effective_delta(&self) -> f64 {
        if self.tempo_sync {
            self.delta_x * self.tempo_scale
        } else {
            self.delta_x
        }
    }

    /// Apply the response curve and gain to a raw sample.
    #[inline]
    pub fn shape(&self, y: f32) -> f32 {
        let y = if self.logarithmic { log_response(y) } else { y };
        y * self.scale
    }
}

/// Sign-preserving exponential response, `0 → 0` and `±1 → ±1`.
#[inline]
pub fn log_response(y: f32) -> f32 {
    y.signum() * ((6.0 * y.abs()).exp2() - 1.0) / 63.0
}

/// What a render call produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderResult {
    pub rendered: bool,
    /// The source wants more blocks (envelopes only).
    pub still_active: bool,
    pub samples_written: usize,
}

impl RenderResult {
    pub const fn failed() -> Self {
        Self {
            rendered: false,
            still_active: false,
            samples_written: 0,
        }
    }
}

/// Evenly spaced samples across `[start_x, end_x]` for drawing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphicRequest {
    pub num_points: usize,
    pub start_x: f32,
    pub end_x: f32,
}

impl GraphicRequest {
    pub fn new(num_points: usize, start_x: f32, end_x: f32) -> Self {
        Self {
            num_points,
            start_x,
            end_x,
        }
    }

    pub fn validate(&self, output_len: usize) -> Result<(), RenderError> {
        if output_len == 0 {
            return Err(RenderError::EmptyOutput);
        }
        if self.num_points == 0
            || self.num_points > output_len
            || !self.start_x.is_finite()
            || !self.end_x.is_finite()
            || self.end_x < self.start_x
        {
            return Err(RenderError::InvalidRequest);
        }
        Ok(())
    }

    /// Spacing between points; a single point sits at `start_x`.
    pub fn step(&self) -> f64 {
        if self.num_points > 1 {
            (self.end_x as f64 - self.start_x as f64) / (self.num_points - 1) as f64
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GraphicResult {
    pub rendered: bool,
    pub points_written: usize,
    pub zero_index: usize,
    pub one_index: usize,
    pub num_wave_points: usize,
    pub num_regions: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_validation() {
        let ok = RenderRequest::new(64, 0.01);
        assert_eq!(ok.validate(64), Ok(()));
        assert_eq!(ok.validate(0), Err(RenderError::EmptyOutput));
        assert_eq!(ok.validate(32), Err(RenderError::InvalidRequest));

        let bad = [
            RenderRequest::new(0, 0.01),
            RenderRequest::new(8, f64::NAN),
            RenderRequest::new(8, -0.1),
            RenderRequest {
                tempo_scale: 0.0,
                ..RenderRequest::new(8, 0.01)
            },
            RenderRequest {
                scale: f32::INFINITY,
                ..RenderRequest::new(8, 0.01)
            },
            RenderRequest {
                unison_index: MAX_UNISON,
                ..RenderRequest::new(8, 0.01)
            },
        ];
        for request in bad {
            assert_eq!(request.validate(64), Err(RenderError::InvalidRequest));
        }
    }

    #[test]
    fn tempo_sync_scales_the_delta() {
        let mut request = RenderRequest {
            tempo_scale: 2.0,
            ..RenderRequest::new(16, 0.25)
        };
        assert_eq!(request.effective_delta(), 0.25);
        request.tempo_sync = true;
        assert_eq!(request.effective_delta(), 0.5);
    }

    #[test]
    fn log_response_keeps_sign_and_endpoints() {
        assert_eq!(log_response(0.0), 0.0);
        assert!((log_response(1.0) - 1.0).abs() < 1e-6);
        assert!((log_response(-1.0) + 1.0).abs() < 1e-6);
        assert!(log_response(0.5) < 0.5);
        assert_eq!(log_response(-0.3), -log_response(0.3));
    }

    #[test]
    fn loop_region_needs_positive_width() {
        let mut env = EnvControlSnapshot {
            loop_enabled: true,
            loop_start: 0.4,
            loop_end: 0.4,
            ..Default::default()
        };
        assert!(!env.has_loop_region());
        env.loop_end = 0.6;
        assert!(env.has_loop_region());
        env.loop_enabled = false;
        assert!(!env.has_loop_region());
    }

    #[test]
    fn graphic_step_spans_the_interval() {
        let request = GraphicRequest::new(5, 0.0, 1.0);
        assert_eq!(request.step(), 0.25);
        assert_eq!(GraphicRequest::new(1, 0.3, 0.3).step(), 0.0);
        assert!(GraphicRequest::new(4, 1.0, 0.0).validate(8).is_err());
    }
}

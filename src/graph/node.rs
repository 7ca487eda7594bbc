#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    dsp::{CurvePiece, Intercept},
    error::RenderError,
    mesh::{MeshSource, MorphPosition},
    synth::control::RenderResult,
};

use super::{
    curve_builder::ChainState,
    wave_builder::WaveShape,
    workspace::{DeformRegion, WaveBuffersMut, WaveView},
};

/// What the interpolator needs to pull intercepts out of a mesh.
#[derive(Clone, Copy)]
pub struct InterpolatorContext<'a> {
    pub mesh: Option<&'a dyn MeshSource>,
    pub morph: MorphPosition,
    /// Interpolate phases the short way around the unit circle.
    pub wrap_phases: bool,
}

/// How intercept amplitudes are mapped before curve building.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scaling {
    #[default]
    Unipolar, // [0, 1]
    Bipolar,     // 2y - 1 in [-1, 1]
    HalfBipolar, // y - 0.5 in [-0.5, 0.5]
}

impl Scaling {
    #[inline]
    pub fn apply(self, y: f32) -> f32 {
        match self {
            Scaling::Unipolar => y.clamp(0.0, 1.0),
            Scaling::Bipolar => (2.0 * y - 1.0).clamp(-1.0, 1.0),
            Scaling::HalfBipolar => (y - 0.5).clamp(-0.5, 0.5),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionerContext {
    pub scaling: Scaling,
    pub min_x: f32,
    pub max_x: f32,
}

/// Synthetic points placed around the real intercepts.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaddingPolicy {
    /// Three points each side, wrapped in cyclic mode.
    #[default]
    Generic,
    /// Two points each side at fixed ±1 / ±2 offsets from the axis bounds.
    FxLegacyFixed,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveContext {
    pub padding: PaddingPolicy,
    pub cyclic: bool,
    pub min_x: f32,
    pub max_x: f32,
    /// Antialiased sampling: favour finer resolutions.
    pub integral_sampling: bool,
    /// Cheap rendering: favour coarser resolutions.
    pub low_resolution: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveContext {
    /// Position whose nearest breakpoint becomes `zero_index`.
    pub anchor_start: f32,
    /// Position whose nearest breakpoint becomes `one_index`.
    pub anchor_end: f32,
}

impl Default for WaveContext {
    fn default() -> Self {
        Self {
            anchor_start: 0.0,
            anchor_end: 1.0,
        }
    }
}

/// Cursor state a sampler reads and advances.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SamplerContext {
    pub phase: f64,
    pub delta_x: f64,
    pub cursor: usize,
}

/// Extracts intercepts from the mesh at a morph position.
///
/// Returns how many intercepts were written to `out`. Zero is a valid
/// answer: no cube covers the position.
pub trait Interpolator: Send + Sync {
    fn run(&self, ctx: &InterpolatorContext<'_>, out: &mut [Intercept])
        -> Result<usize, RenderError>;
}

/// Scales, wraps or clamps, sorts and separates intercepts in place.
///
/// Returns the number of intercepts that survived validation; they occupy
/// the front of the slice afterwards.
pub trait Positioner: Send + Sync {
    fn run(&self, intercepts: &mut [Intercept], ctx: &PositionerContext)
        -> Result<usize, RenderError>;
}

/// Pads the intercepts and emits one curve piece per padded point.
///
/// `chain` is the calling voice's continuation; builders that do not chain
/// ignore it.
pub trait CurveBuilder: Send + Sync {
    fn run(
        &self,
        intercepts: &[Intercept],
        padded: &mut [Intercept],
        curves: &mut [CurvePiece],
        ctx: &CurveContext,
        chain: Option<&mut ChainState>,
    ) -> Result<usize, RenderError>;
}

/// Flattens curve pieces into breakpoint arrays.
pub trait WaveBuilder: Send + Sync {
    fn run(
        &self,
        curves: &[CurvePiece],
        wave: WaveBuffersMut<'_>,
        regions: &mut [DeformRegion],
        ctx: &WaveContext,
    ) -> Result<WaveShape, RenderError>;
}

/// Walks a flattened waveform to produce samples.
pub trait Sampler: Send + Sync {
    fn run(&self, wave: WaveView<'_>, output: &mut [f32], ctx: &mut SamplerContext)
        -> RenderResult;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaling_bounds_hold_for_out_of_range_input() {
        for &y in &[-3.0, -0.2, 0.0, 0.3, 0.5, 1.0, 1.7, 42.0] {
            assert!((0.0..=1.0).contains(&Scaling::Unipolar.apply(y)));
            assert!((-1.0..=1.0).contains(&Scaling::Bipolar.apply(y)));
            assert!((-0.5..=0.5).contains(&Scaling::HalfBipolar.apply(y)));
        }
        assert_eq!(Scaling::Bipolar.apply(0.75), 0.5);
        assert_eq!(Scaling::HalfBipolar.apply(0.75), 0.25);
    }
}

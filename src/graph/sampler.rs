use crate::synth::control::RenderResult;

use super::{
    node::{Sampler, SamplerContext},
    workspace::WaveView,
};

/// Piecewise-linear walk over the breakpoints.
///
/// Stateless: the phase and cursor live in the [`SamplerContext`] the
/// caller owns. Looping and cycle wraparound are the caller's job; this
/// stage only clamps at the ends.
pub struct LinearSampler;

pub static LINEAR_SAMPLER: LinearSampler = LinearSampler;

impl LinearSampler {
    /// Value of the wave at `phase`, moving `cursor` to the segment used.
    ///
    /// The cursor walks forward while the phase is past the next
    /// breakpoint and backward if the phase jumped behind it.
    #[inline]
    pub fn sample_at(wave: &WaveView<'_>, phase: f64, cursor: &mut usize) -> f32 {
        let n = wave.len();
        if n == 0 {
            return 0.0;
        }
        if phase <= wave.x[0] as f64 {
            *cursor = 0;
            return zero_nan(wave.y[0]);
        }
        if phase >= wave.x[n - 1] as f64 {
            *cursor = n - 1;
            return zero_nan(wave.y[n - 1]);
        }

        let mut c = (*cursor).min(n - 2);
        while c > 0 && phase < wave.x[c] as f64 {
            c -= 1;
        }
        while phase >= wave.x[c + 1] as f64 {
            c += 1;
        }
        *cursor = c;

        zero_nan(((phase - wave.x[c] as f64) * wave.slope[c] as f64) as f32 + wave.y[c])
    }
}

#[inline]
fn zero_nan(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value
    }
}

impl Sampler for LinearSampler {
    fn run(
        &self,
        wave: WaveView<'_>,
        output: &mut [f32],
        ctx: &mut SamplerContext,
    ) -> RenderResult {
        if wave.is_empty() || output.is_empty() {
            return RenderResult::failed();
        }

        for sample in output.iter_mut() {
            *sample = Self::sample_at(&wave, ctx.phase, &mut ctx.cursor);
            ctx.phase += ctx.delta_x;
        }

        RenderResult {
            rendered: true,
            still_active: false,
            samples_written: output.len(),
        }
    }
}

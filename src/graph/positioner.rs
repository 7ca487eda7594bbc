use crate::{dsp::Intercept, error::RenderError};

use super::node::{Positioner, PositionerContext};

/// Minimum x gap enforced between neighbouring intercepts.
pub const SEPARATION: f32 = 1e-4;

/// Clamps x into the axis bounds. Used for envelopes and one-shot curves.
pub struct LinearPositioner;

/// Wraps x modulo the axis range. Used for cyclic wavetables.
pub struct CyclicPositioner;

pub static LINEAR: LinearPositioner = LinearPositioner;
pub static CYCLIC: CyclicPositioner = CyclicPositioner;

/// The shared positioner for a cyclic or linear axis.
pub fn for_mode(cyclic: bool) -> &'static dyn Positioner {
    if cyclic {
        &CYCLIC
    } else {
        &LINEAR
    }
}

impl Positioner for LinearPositioner {
    fn run(
        &self,
        intercepts: &mut [Intercept],
        ctx: &PositionerContext,
    ) -> Result<usize, RenderError> {
        check_bounds(ctx)?;
        let count = retain_finite(intercepts);
        if count == 0 {
            return Err(RenderError::NoIntercepts);
        }
        let intercepts = &mut intercepts[..count];

        for icpt in intercepts.iter_mut() {
            icpt.adjusted_x = icpt.x;
            icpt.y = ctx.scaling.apply(icpt.y);
            icpt.x = icpt.x.clamp(ctx.min_x, ctx.max_x);
        }

        order_and_separate(intercepts, ctx.min_x, ctx.max_x);
        Ok(count)
    }
}

impl Positioner for CyclicPositioner {
    fn run(
        &self,
        intercepts: &mut [Intercept],
        ctx: &PositionerContext,
    ) -> Result<usize, RenderError> {
        check_bounds(ctx)?;
        let count = retain_finite(intercepts);
        if count == 0 {
            return Err(RenderError::NoIntercepts);
        }
        let intercepts = &mut intercepts[..count];
        let range = ctx.max_x - ctx.min_x;

        for icpt in intercepts.iter_mut() {
            icpt.adjusted_x = icpt.x;
            icpt.y = ctx.scaling.apply(icpt.y);

            let mut wrapped = ctx.min_x + (icpt.x - ctx.min_x).rem_euclid(range);
            if wrapped >= ctx.max_x {
                wrapped = ctx.min_x;
            }
            icpt.is_wrapped = wrapped != icpt.x;
            icpt.x = wrapped;
        }

        order_and_separate(intercepts, ctx.min_x, ctx.max_x);
        Ok(count)
    }
}

fn check_bounds(ctx: &PositionerContext) -> Result<(), RenderError> {
    let valid = ctx.min_x.is_finite() && ctx.max_x.is_finite() && ctx.max_x > ctx.min_x;
    if valid {
        Ok(())
    } else {
        Err(RenderError::InvalidBounds)
    }
}

/// Compact intercepts with finite coordinates to the front; returns how many.
fn retain_finite(intercepts: &mut [Intercept]) -> usize {
    let mut kept = 0;
    for i in 0..intercepts.len() {
        let icpt = intercepts[i];
        if icpt.x.is_finite() && icpt.y.is_finite() {
            intercepts[kept] = icpt;
            kept += 1;
        }
    }
    kept
}

/// Sort by x, then make x strictly increasing and keep the ends in bounds.
///
/// The gap shrinks to `range / n` when the axis is too crowded for
/// `SEPARATION`, and never drops below one float step of the neighbour.
pub(crate) fn order_and_separate(intercepts: &mut [Intercept], min_x: f32, max_x: f32) {
    let n = intercepts.len();
    if n == 0 {
        return;
    }

    intercepts.sort_unstable_by(|a, b| a.x.total_cmp(&b.x));
    let gap = SEPARATION.min((max_x - min_x) / n as f32);

    for i in 1..n {
        if intercepts[i].x <= intercepts[i - 1].x {
            intercepts[i].x = step_above(intercepts[i - 1].x, gap);
        }
    }

    // Pull the tail back into range, pushing earlier points down as needed.
    if intercepts[n - 1].x > max_x {
        intercepts[n - 1].x = max_x;
        for i in (0..n - 1).rev() {
            if intercepts[i].x < intercepts[i + 1].x {
                break;
            }
            intercepts[i].x = step_below(intercepts[i + 1].x, gap);
        }
    }

    if intercepts[0].x < min_x {
        intercepts[0].x = min_x;
        for i in 1..n {
            if intercepts[i].x > intercepts[i - 1].x {
                break;
            }
            intercepts[i].x = step_above(intercepts[i - 1].x, gap);
        }
    }
}

/// `x + gap`, or the next representable value when the add rounds away.
pub(crate) fn step_above(x: f32, gap: f32) -> f32 {
    let next = x + gap;
    if next > x {
        return next;
    }
    match x {
        x if !x.is_finite() => x,
        x if x == 0.0 => f32::from_bits(1),
        x if x > 0.0 => f32::from_bits(x.to_bits() + 1),
        x => f32::from_bits(x.to_bits() - 1),
    }
}

/// `x - gap`, or the previous representable value when the subtract rounds away.
pub(crate) fn step_below(x: f32, gap: f32) -> f32 {
    -step_above(-x, gap)
}

use crate::{
    dsp::{curvelet, CurvePiece, Point},
    error::RenderError,
};

use super::{
    node::{WaveBuilder, WaveContext},
    workspace::{DeformRegion, WaveBuffersMut},
};

/*
Wave Building
=============

Neighbouring curve pieces overlap: piece i runs from its `a` to its `c`,
and piece i+1 runs from its `a` (= piece i's `b`) to its `c`. The wave
between the two middle points is a crossfade of piece i's second half with
piece i+1's first half:

    piece i       ───────╮
                          ╲___________            tail: t = 0.5 → 1.0
    piece i+1        ___________╱────────         head: t = 0.0 → 0.5
                     ↑                 ↑
                   i mid            i+1 mid
    weight         0 ─────────────────→ 1         smoothstep from the table

The crossfade walks the finer of the two resolutions, so a coarse piece
next to a fine one is read at the fine spacing and the join has no step.
The result starts at the first piece's midpoint and ends at the last
piece's midpoint; the padding guarantees that covers the real axis.

Slopes are precomputed per breakpoint so the sampler does one multiply-add
per sample. A breakpoint gap smaller than MIN_DX is treated as MIN_DX.
*/

/// Smallest x gap used as a slope denominator.
pub const MIN_DX: f32 = 1e-6;

/// Summary of a built wave.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WaveShape {
    pub count: usize,
    /// Breakpoint nearest `WaveContext::anchor_start`.
    pub zero_index: usize,
    /// Breakpoint nearest `WaveContext::anchor_end`.
    pub one_index: usize,
    pub num_regions: usize,
}

/// Crossfading wave builder.
pub struct BlendingWaveBuilder;

pub static BLENDING: BlendingWaveBuilder = BlendingWaveBuilder;

/// Breakpoints needed to flatten `curves`.
pub fn points_needed(curves: &[CurvePiece]) -> usize {
    curves
        .windows(2)
        .map(|pair| pair[0].segments().max(pair[1].segments()) / 2)
        .sum::<usize>()
        + 1
}

impl WaveBuilder for BlendingWaveBuilder {
    fn run(
        &self,
        curves: &[CurvePiece],
        wave: WaveBuffersMut<'_>,
        regions: &mut [DeformRegion],
        ctx: &WaveContext,
    ) -> Result<WaveShape, RenderError> {
        if curves.len() < 2 {
            return Err(RenderError::TooFewIntercepts);
        }
        let count = points_needed(curves);
        let num_regions = curves.len() - 1;
        if count > wave.x.len() || num_regions > regions.len() {
            return Err(RenderError::CapacityExceeded);
        }

        let WaveBuffersMut { x, y, slope, diff_x } = wave;
        let table = curvelet::table();
        let mut k = 0;

        let mut push = |point: Point, k: &mut usize| {
            let px = if *k > 0 { point.x.max(x[*k - 1]) } else { point.x };
            x[*k] = px;
            y[*k] = point.y;
            *k += 1;
        };

        for (region, pair) in regions.iter_mut().zip(curves.windows(2)) {
            let (left, right) = (&pair[0], &pair[1]);
            let steps = left.segments().max(right.segments()) / 2;
            let start = k;
            for j in 0..steps {
                let f = j as f32 / steps as f32;
                let tail = left.point_at(0.5 + 0.5 * f);
                let head = right.point_at(0.5 * f);
                push(tail.lerp(head, table.fade(f)), &mut k);
            }
            *region = DeformRegion {
                start,
                end: k,
                cube: left.b.cube,
            };
        }
        if let Some(last) = curves.last() {
            push(last.point_at(0.5), &mut k);
        }
        debug_assert_eq!(k, count);

        for i in 0..count - 1 {
            let dx = x[i + 1] - x[i];
            diff_x[i] = dx;
            slope[i] = (y[i + 1] - y[i]) / dx.max(MIN_DX);
        }
        diff_x[count - 1] = 0.0;
        slope[count - 1] = 0.0;

        Ok(WaveShape {
            count,
            zero_index: nearest(&x[..count], ctx.anchor_start),
            one_index: nearest(&x[..count], ctx.anchor_end),
            num_regions,
        })
    }
}

fn nearest(xs: &[f32], target: f32) -> usize {
    xs.iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| (*a - target).abs().total_cmp(&(*b - target).abs()))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

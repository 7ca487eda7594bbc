use crate::{
    dsp::{
        curvelet::{segments, NUM_LEVELS},
        CurvePiece, Intercept,
    },
    error::RenderError,
};

use super::{
    node::{CurveBuilder, CurveContext, PaddingPolicy},
    positioner::{step_above, SEPARATION},
};

/*
Curve Building
==============

Curve pieces need a neighbour on each side, and the rendered wave must
cover the whole axis, so the real intercepts are surrounded by synthetic
padding before any piece is built.

  Generic, linear axis   three points each side, PADDING_DELTA apart,
                         holding the nearest real amplitude:

        ·  ·  ·  [ r0  r1  ...  rN ]  ·  ·  ·
      -3d -2d -d                      +d +2d +3d

  Generic, cyclic axis   the last three real points shifted one range
                         down before the start, the first three shifted
                         one range up after the end, so the wave joins
                         itself seamlessly.

  FxLegacyFixed          two points each side at min-2, min-1 and
                         max+1, max+2. Kept for curves authored against
                         the older fixed window.

Each padded point becomes the middle point `b` of one piece. The two
outermost pieces borrow a reflected guard point as their missing
neighbour, so a Generic build of N intercepts yields N + 6 pieces.

Resolution
----------

A piece spanning a wide stretch of x needs more segments than one squeezed
between close neighbours. For the piece around intercept i the span is
x[i+1] - x[i-1]; level L (RESOLUTION >> L segments) is picked when

    span >= base * (RESOLUTION >> L)

trying the finest level first. `integral_sampling` halves `base` (finer),
`low_resolution` quadruples it (coarser). Padding pieces copy the level of
the nearest real piece.

Voice chaining
--------------

A sustained oscillator rebuilds its wave every block. In cyclic mode the
start of the new wave is padded with the previous block's tail, so the
seam between what was just played and what comes next stays continuous.
The tail lives in a `ChainState` owned by the voice and passed in on each
call. It must be reset whenever the mesh or the cyclic flag changes.
*/

/// Spacing of Generic padding on a linear axis.
pub const PADDING_DELTA: f32 = 0.25;
/// Number of previous-call intercepts a chain remembers.
pub const CHAIN_POINTS: usize = 3;

/// Span threshold unit for resolution selection.
const BASE_THRESHOLD: f32 = 1.0 / 256.0;

impl PaddingPolicy {
    pub const fn points_per_side(self) -> usize {
        match self {
            PaddingPolicy::Generic => 3,
            PaddingPolicy::FxLegacyFixed => 2,
        }
    }
}

/// Pads according to `CurveContext::padding`. Stateless.
pub struct PaddedCurveBuilder;

/// Generic padding with cross-call continuity through a [`ChainState`].
pub struct VoiceChainingCurveBuilder;

pub static PADDED: PaddedCurveBuilder = PaddedCurveBuilder;
pub static VOICE_CHAINING: VoiceChainingCurveBuilder = VoiceChainingCurveBuilder;

/// Continuation carried between builds of one voice.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChainState {
    tail: [Intercept; CHAIN_POINTS],
    len: usize,
    cyclic: bool,
    range: f32,
}

impl ChainState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.len = 0;
    }

    pub fn is_primed(&self) -> bool {
        self.len > 0
    }

    /// Last intercepts of the previous build, in ascending x.
    pub fn tail(&self) -> &[Intercept] {
        &self.tail[..self.len]
    }

    fn usable_for(&self, ctx: &CurveContext) -> bool {
        self.is_primed()
            && ctx.cyclic
            && self.cyclic
            && (self.range - (ctx.max_x - ctx.min_x)).abs() < 1e-6
    }

    fn remember(&mut self, intercepts: &[Intercept], ctx: &CurveContext) {
        let n = intercepts.len().min(CHAIN_POINTS);
        let start = intercepts.len() - n;
        self.tail[..n].copy_from_slice(&intercepts[start..]);
        self.len = n;
        self.cyclic = ctx.cyclic;
        self.range = ctx.max_x - ctx.min_x;
    }
}

impl CurveBuilder for PaddedCurveBuilder {
    fn run(
        &self,
        intercepts: &[Intercept],
        padded: &mut [Intercept],
        curves: &mut [CurvePiece],
        ctx: &CurveContext,
        _chain: Option<&mut ChainState>,
    ) -> Result<usize, RenderError> {
        build(intercepts, padded, curves, ctx, None)
    }
}

impl CurveBuilder for VoiceChainingCurveBuilder {
    fn run(
        &self,
        intercepts: &[Intercept],
        padded: &mut [Intercept],
        curves: &mut [CurvePiece],
        ctx: &CurveContext,
        chain: Option<&mut ChainState>,
    ) -> Result<usize, RenderError> {
        let ctx = CurveContext {
            padding: PaddingPolicy::Generic,
            ..*ctx
        };
        let Some(chain) = chain else {
            return build(intercepts, padded, curves, &ctx, None);
        };

        let previous = chain.usable_for(&ctx).then(|| chain.tail);
        let previous_len = chain.len;
        let count = build(
            intercepts,
            padded,
            curves,
            &ctx,
            previous.as_ref().map(|tail| &tail[..previous_len]),
        )?;
        chain.remember(intercepts, &ctx);
        Ok(count)
    }
}

fn build(
    intercepts: &[Intercept],
    padded: &mut [Intercept],
    curves: &mut [CurvePiece],
    ctx: &CurveContext,
    previous_tail: Option<&[Intercept]>,
) -> Result<usize, RenderError> {
    let n = intercepts.len();
    if n < 2 {
        return Err(RenderError::TooFewIntercepts);
    }
    let range = ctx.max_x - ctx.min_x;
    if !(range.is_finite() && range > 0.0) {
        return Err(RenderError::InvalidBounds);
    }
    let pad = ctx.padding.points_per_side();
    let total = n + 2 * pad;
    if total > padded.len() || total > curves.len() {
        return Err(RenderError::CapacityExceeded);
    }

    let first = intercepts[0];
    let last = intercepts[n - 1];
    padded[pad..pad + n].copy_from_slice(intercepts);

    for k in 1..=pad {
        let offset = k as f32;
        let (before, after) = match ctx.padding {
            PaddingPolicy::Generic if ctx.cyclic => (
                wrapped_before(previous_tail.unwrap_or(intercepts), k, range),
                wrapped_after(intercepts, k, range),
            ),
            PaddingPolicy::Generic => (
                held(&first, first.x - offset * PADDING_DELTA),
                held(&last, last.x + offset * PADDING_DELTA),
            ),
            PaddingPolicy::FxLegacyFixed => (
                held(&first, ctx.min_x - offset),
                held(&last, ctx.max_x + offset),
            ),
        };
        padded[pad - k] = Intercept {
            pad_before: true,
            ..before
        };
        padded[pad + n - 1 + k] = Intercept {
            pad_after: true,
            ..after
        };
    }

    for i in 1..total {
        if padded[i].x <= padded[i - 1].x {
            padded[i].x = step_above(padded[i - 1].x, SEPARATION);
        }
    }

    let padded = &padded[..total];
    for (i, curve) in curves[..total].iter_mut().enumerate() {
        let anchor = i.clamp(pad, pad + n - 1);
        let span = padded[anchor + 1].x - padded[anchor - 1].x;
        let level = resolution_level(span, ctx);
        *curve = CurvePiece::with_level(
            neighbour(padded, i as isize - 1),
            padded[i],
            neighbour(padded, i as isize + 1),
            level,
        );
    }

    Ok(total)
}

/// Finest level whose threshold the span reaches.
fn resolution_level(span: f32, ctx: &CurveContext) -> usize {
    let mut base = BASE_THRESHOLD;
    if ctx.integral_sampling {
        base *= 0.5;
    }
    if ctx.low_resolution {
        base *= 4.0;
    }
    (0..NUM_LEVELS)
        .find(|&level| span >= base * segments(level) as f32)
        .unwrap_or(NUM_LEVELS - 1)
}

/// A padding point at `x` holding `source`'s amplitude.
fn held(source: &Intercept, x: f32) -> Intercept {
    Intercept::new(x, source.y)
}

fn wrapped_before(source: &[Intercept], k: usize, range: f32) -> Intercept {
    let m = source.len();
    let index = (m as isize - k as isize).rem_euclid(m as isize) as usize;
    let cycles = ((k - 1) / m + 1) as f32;
    wrapped(&source[index], -cycles * range)
}

fn wrapped_after(source: &[Intercept], k: usize, range: f32) -> Intercept {
    let m = source.len();
    let cycles = ((k - 1) / m + 1) as f32;
    wrapped(&source[(k - 1) % m], cycles * range)
}

fn wrapped(source: &Intercept, dx: f32) -> Intercept {
    Intercept {
        cube: None,
        is_wrapped: true,
        ..source.shifted(dx)
    }
}

/// Point `i` of `points`, or a reflected guard one step beyond either end.
fn neighbour(points: &[Intercept], i: isize) -> Intercept {
    let len = points.len();
    if i < 0 {
        let (p0, p1) = (points[0], points[1]);
        return Intercept {
            pad_before: true,
            ..Intercept::new(2.0 * p0.x - p1.x, p0.y)
        };
    }
    let i = i as usize;
    if i >= len {
        let (p0, p1) = (points[len - 1], points[len - 2]);
        return Intercept {
            pad_after: true,
            ..Intercept::new(2.0 * p0.x - p1.x, p0.y)
        };
    }
    points[i]
}

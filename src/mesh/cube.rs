#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{lerp_phase, Dim, MorphPosition, Vertex, AXIS_EPSILON};

/*
Vertex Cubes
============

A cube is eight vertices, one per corner of the (time, red, blue) morph
space. Each corner carries its own morph coordinates, so a cube may be
skewed: the low-time face of one cube does not have to sit at time = 0.

    corner index bits:  bit0 = high time face
                        bit1 = high red face
                        bit2 = high blue face

            6 ───────── 7          blue
           ╱│          ╱│           ↑  red
          4 ───────── 5 │           │ ↗
          │ 2 ────────│─ 3          │╱
          │╱          │╱            └──→ time
          0 ───────── 1

Reducing a cube to one vertex at a morph position happens in two steps:

  1. On each time face, blend along red, then along blue. Each blend uses
     the actual red/blue values of the two vertices involved, not the
     cube's nominal bounds. The result is one "pole" vertex per face.
  2. Blend the two poles along time, again using their own time values.

If the morph position falls outside any of those pairs the cube does not
contribute at this position.
*/

/// Eight corner vertices spanning a region of morph space.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertCube {
    vertices: [Vertex; 8],
}

impl VertCube {
    pub const fn new(vertices: [Vertex; 8]) -> Self {
        Self { vertices }
    }

    /// A cube covering the whole unit morph space with one fixed point.
    pub fn spanning(phase: f32, amp: f32, curve: f32) -> Self {
        let mut vertices = [Vertex::default(); 8];
        for (corner, vertex) in vertices.iter_mut().enumerate() {
            let (time, red, blue) = Self::corner_bits(corner);
            *vertex = Vertex::new(
                time as u8 as f32,
                phase,
                amp,
                red as u8 as f32,
                blue as u8 as f32,
                curve,
            );
        }
        Self { vertices }
    }

    #[inline]
    pub const fn corner_index(time_high: bool, red_high: bool, blue_high: bool) -> usize {
        (time_high as usize) | ((red_high as usize) << 1) | ((blue_high as usize) << 2)
    }

    #[inline]
    pub const fn corner_bits(corner: usize) -> (bool, bool, bool) {
        (corner & 1 != 0, corner & 2 != 0, corner & 4 != 0)
    }

    #[inline]
    pub fn corner(&self, time_high: bool, red_high: bool, blue_high: bool) -> &Vertex {
        &self.vertices[Self::corner_index(time_high, red_high, blue_high)]
    }

    pub fn corner_mut(&mut self, time_high: bool, red_high: bool, blue_high: bool) -> &mut Vertex {
        &mut self.vertices[Self::corner_index(time_high, red_high, blue_high)]
    }

    pub fn vertices(&self) -> &[Vertex; 8] {
        &self.vertices
    }

    /// Smallest and largest value of `dim` across all corners.
    pub fn bounds(&self, dim: Dim) -> (f32, f32) {
        self.vertices
            .iter()
            .map(|v| v.get(dim))
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), value| {
                (lo.min(value), hi.max(value))
            })
    }

    /// The vertex on one time face at the morph position's red/blue coordinates.
    pub fn pole(&self, morph: &MorphPosition, time_high: bool, wrap_phases: bool) -> Option<Vertex> {
        let low_blue = reduce(
            self.corner(time_high, false, false),
            self.corner(time_high, true, false),
            Dim::Red,
            morph.red,
            wrap_phases,
        )?;
        let high_blue = reduce(
            self.corner(time_high, false, true),
            self.corner(time_high, true, true),
            Dim::Red,
            morph.red,
            wrap_phases,
        )?;
        reduce(&low_blue, &high_blue, Dim::Blue, morph.blue, wrap_phases)
    }

    /// Both time-face poles, or `None` if the position misses either face.
    pub fn poles(&self, morph: &MorphPosition, wrap_phases: bool) -> Option<(Vertex, Vertex)> {
        let low = self.pole(morph, false, wrap_phases)?;
        let high = self.pole(morph, true, wrap_phases)?;
        Some((low, high))
    }

    /// Fraction of the way from the low to the high pole along time.
    pub fn time_progress(low: &Vertex, high: &Vertex, time: f32) -> Option<f32> {
        progress(low.get(Dim::Time), high.get(Dim::Time), time)
    }

    /// Whether this cube contributes a vertex at `morph`.
    pub fn overlaps(&self, morph: &MorphPosition) -> bool {
        self.poles(morph, false)
            .and_then(|(low, high)| Self::time_progress(&low, &high, morph.time))
            .is_some()
    }

    /// Trilinear blend of all eight corners using the cube's axis bounds.
    ///
    /// Cheaper than the pole path and exact for axis-aligned cubes.
    pub fn trilinear(&self, morph: &MorphPosition, wrap_phases: bool) -> Option<Vertex> {
        let (t_lo, t_hi) = self.bounds(Dim::Time);
        let (r_lo, r_hi) = self.bounds(Dim::Red);
        let (b_lo, b_hi) = self.bounds(Dim::Blue);
        let tp = progress(t_lo, t_hi, morph.time)?;
        let rp = progress(r_lo, r_hi, morph.red)?;
        let bp = progress(b_lo, b_hi, morph.blue)?;

        let reference_phase = self.vertices[0].get(Dim::Phase);
        let mut out = Vertex::default();
        for (corner, vertex) in self.vertices.iter().enumerate() {
            let (time, red, blue) = Self::corner_bits(corner);
            let weight = face_weight(time, tp) * face_weight(red, rp) * face_weight(blue, bp);
            if weight == 0.0 {
                continue;
            }
            for (dst, &value) in out.values.iter_mut().zip(vertex.values.iter()) {
                *dst += value * weight;
            }
            if wrap_phases {
                // Re-accumulate the phase unwrapped around corner 0.
                let phase = Dim::Phase.index();
                out.values[phase] += (lerp_phase(reference_phase, vertex.values[phase], 1.0, true)
                    - vertex.values[phase])
                    * weight;
            }
        }
        Some(out)
    }
}

/// Position of `pos` between `lo` and `hi` in [0, 1], or `None` when outside.
pub(crate) fn progress(lo: f32, hi: f32, pos: f32) -> Option<f32> {
    let span = hi - lo;
    if span.abs() < AXIS_EPSILON {
        return ((pos - lo).abs() < AXIS_EPSILON).then_some(0.0);
    }
    let fraction = (pos - lo) / span;
    if !(-AXIS_EPSILON..=1.0 + AXIS_EPSILON).contains(&fraction) {
        return None;
    }
    Some(fraction.clamp(0.0, 1.0))
}

#[inline]
fn face_weight(high: bool, fraction: f32) -> f32 {
    if high {
        fraction
    } else {
        1.0 - fraction
    }
}

fn reduce(a: &Vertex, b: &Vertex, dim: Dim, pos: f32, wrap_phases: bool) -> Option<Vertex> {
    let t = progress(a.get(dim), b.get(dim), pos)?;
    Some(a.lerp(b, t, wrap_phases))
}

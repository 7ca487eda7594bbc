use std::sync::LazyLock;

/*
Curvelet Table
==============

Every curve piece in the rasterizer has the same shape family: a rational
quadratic Bézier through three control points a → b → c, where the weight
on the middle point decides how tightly the curve hugs it.

    weight w = 1          w = 8              w = 64
                 b                 b                 b
                ╱ ╲               ╱╲                ╱╲
              .´   `.           .´  `.             /  \
             a       c         a      c           a    c
    (smooth parabola)     (rounded corner)    (almost the polygon)

For a parameter t in [0, 1] the point is

    P(t) = (B0(t)·a + B1(t)·w·b + B2(t)·c) / (B0(t) + B1(t)·w + B2(t))

with the Bernstein basis B0 = (1-t)², B1 = 2t(1-t), B2 = t². The three
normalised factors only depend on (t, w), so they are precomputed once
into a table indexed by sharpness row and t-index. A render call never
evaluates a power or a division for curve shapes; it multiplies three
table entries by three control points.

Vocabulary
----------

  sharpness   Intercept::shp in [0, 1]. Mapped to w = 2^(6·shp), so 0 is
              a plain parabola and 1 gives w = 64.

  row         One of SHARPNESS_STEPS + 1 precomputed sharpness values.
              Fractional sharpness blends the two nearest rows.

  level       Resolution level. Level L uses RESOLUTION >> L segments and
              reads the table with a stride of 1 << L.

  fade        The crossfade transfer function (smoothstep) used when
              joining neighbouring pieces in the wave builder.

The table is process-wide and immutable once built. `warm_up()` forces
construction off the audio thread; `Workspace::prepare()` calls it.
*/

/// Segments per curve piece at the finest level.
pub const RESOLUTION: usize = 64;
/// Number of resolution levels: 64, 32, 16, 8, 4 segments.
pub const NUM_LEVELS: usize = 5;
/// Sharpness rows in the table (plus one for sharpness = 1).
pub const SHARPNESS_STEPS: usize = 32;

/// log2 of the middle weight at full sharpness.
const MAX_WEIGHT_OCTAVES: f32 = 6.0;

pub struct CurveletTable {
    basis: Box<[[[f32; 3]; RESOLUTION + 1]; SHARPNESS_STEPS + 1]>,
    fade: [f32; RESOLUTION + 1],
}

static CURVELET_TABLE: LazyLock<CurveletTable> = LazyLock::new(CurveletTable::build);

/// The shared table, built on first use.
#[inline]
pub fn table() -> &'static CurveletTable {
    &CURVELET_TABLE
}

/// Build the table now so the first render call does not.
pub fn warm_up() {
    LazyLock::force(&CURVELET_TABLE);
}

/// Number of segments at a resolution level.
#[inline]
pub const fn segments(level: usize) -> usize {
    RESOLUTION >> level
}

impl CurveletTable {
    fn build() -> Self {
        let mut basis = Box::new([[[0.0f32; 3]; RESOLUTION + 1]; SHARPNESS_STEPS + 1]);
        for (row_index, row) in basis.iter_mut().enumerate() {
            let sharpness = row_index as f32 / SHARPNESS_STEPS as f32;
            let weight = (sharpness * MAX_WEIGHT_OCTAVES).exp2();
            for (i, entry) in row.iter_mut().enumerate() {
                let t = i as f32 / RESOLUTION as f32;
                let b0 = (1.0 - t) * (1.0 - t);
                let b1 = 2.0 * t * (1.0 - t) * weight;
                let b2 = t * t;
                let norm = 1.0 / (b0 + b1 + b2);
                *entry = [b0 * norm, b1 * norm, b2 * norm];
            }
        }

        let mut fade = [0.0f32; RESOLUTION + 1];
        for (i, value) in fade.iter_mut().enumerate() {
            let t = i as f32 / RESOLUTION as f32;
            *value = t * t * (3.0 - 2.0 * t);
        }

        Self { basis, fade }
    }

    /// Normalised basis weights for table index `index` at `sharpness`.
    ///
    /// `index` is in finest-level units (0..=RESOLUTION).
    #[inline]
    pub fn basis(&self, sharpness: f32, index: usize) -> [f32; 3] {
        let index = index.min(RESOLUTION);
        let scaled = sharpness.clamp(0.0, 1.0) * SHARPNESS_STEPS as f32;
        let row = (scaled as usize).min(SHARPNESS_STEPS - 1);
        let frac = scaled - row as f32;
        let lo = self.basis[row][index];
        let hi = self.basis[row + 1][index];
        [
            lo[0] + (hi[0] - lo[0]) * frac,
            lo[1] + (hi[1] - lo[1]) * frac,
            lo[2] + (hi[2] - lo[2]) * frac,
        ]
    }

    /// Crossfade weight for a position in [0, 1].
    #[inline]
    pub fn fade(&self, position: f32) -> f32 {
        let scaled = position.clamp(0.0, 1.0) * RESOLUTION as f32;
        let i = (scaled as usize).min(RESOLUTION - 1);
        let frac = scaled - i as f32;
        self.fade[i] + (self.fade[i + 1] - self.fade[i]) * frac
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basis_is_normalised() {
        let table = table();
        for &sharpness in &[0.0, 0.33, 0.5, 1.0] {
            for index in [0, 7, RESOLUTION / 2, RESOLUTION] {
                let [b0, b1, b2] = table.basis(sharpness, index);
                assert!((b0 + b1 + b2 - 1.0).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn endpoints_hit_outer_control_points() {
        let table = table();
        assert_eq!(table.basis(0.7, 0), [1.0, 0.0, 0.0]);
        let [b0, b1, b2] = table.basis(0.7, RESOLUTION);
        assert!(b0.abs() < 1e-6 && b1.abs() < 1e-6 && (b2 - 1.0).abs() < 1e-6);
    }

    #[test]
    fn sharper_curves_pull_harder_towards_middle_point() {
        let table = table();
        let soft = table.basis(0.0, RESOLUTION / 2)[1];
        let sharp = table.basis(1.0, RESOLUTION / 2)[1];
        assert!((soft - 0.5).abs() < 1e-6);
        assert!(sharp > 0.95, "expected sharp curve to nearly touch b, got {sharp}");
    }

    #[test]
    fn fade_is_monotonic_smoothstep() {
        let table = table();
        assert_eq!(table.fade(0.0), 0.0);
        assert!((table.fade(1.0) - 1.0).abs() < 1e-6);
        assert!((table.fade(0.5) - 0.5).abs() < 1e-6);
        let mut previous = 0.0;
        for i in 0..=100 {
            let value = table.fade(i as f32 / 100.0);
            assert!(value >= previous);
            previous = value;
        }
    }
}

use super::curvelet::{self, NUM_LEVELS, RESOLUTION};
use super::intercept::Intercept;

/// A 2-D breakpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn lerp(self, other: Point, t: f32) -> Point {
        Point {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }
}

/// One three-point curve segment and its discretised shape.
///
/// The shape runs from `a` (t = 0) past `b` to `c` (t = 1). Its midpoint,
/// t = 0.5, is where the curve comes closest to `b`. The transform array
/// holds `segments() + 1` points sampled from the shared curvelet table.
#[derive(Debug, Clone, Copy)]
pub struct CurvePiece {
    pub a: Intercept,
    pub b: Intercept,
    pub c: Intercept,
    level: usize,
    transform: [Point; RESOLUTION + 1],
}

impl CurvePiece {
    /// Build a piece at the finest resolution.
    pub fn new(a: Intercept, b: Intercept, c: Intercept) -> Self {
        Self::with_level(a, b, c, 0)
    }

    /// Build a piece at resolution level `level` (see [`curvelet::segments`]).
    pub fn with_level(a: Intercept, b: Intercept, c: Intercept, level: usize) -> Self {
        debug_assert!(a.x <= b.x && b.x <= c.x, "curve points must be ordered in x");
        let mut piece = Self {
            a,
            b,
            c,
            level: level.min(NUM_LEVELS - 1),
            transform: [Point::default(); RESOLUTION + 1],
        };
        piece.recalculate();
        piece
    }

    /// Refill the transform array from the curvelet table.
    pub fn recalculate(&mut self) {
        let table = curvelet::table();
        let stride = 1usize << self.level;
        let sharpness = self.b.shp;
        let segments = self.segments();
        let (a, b, c) = (self.a, self.b, self.c);
        for (i, point) in self.transform[..=segments].iter_mut().enumerate() {
            let [wa, wb, wc] = table.basis(sharpness, i * stride);
            *point = Point {
                x: wa * a.x + wb * b.x + wc * c.x,
                y: wa * a.y + wb * b.y + wc * c.y,
            };
        }
    }

    #[inline]
    pub fn level(&self) -> usize {
        self.level
    }

    #[inline]
    pub fn segments(&self) -> usize {
        curvelet::segments(self.level)
    }

    /// The discretised shape for the current level.
    #[inline]
    pub fn transform(&self) -> &[Point] {
        &self.transform[..=self.segments()]
    }

    /// Point at `t` in [0, 1], interpolated between transform entries.
    #[inline]
    pub fn point_at(&self, t: f32) -> Point {
        let segments = self.segments();
        let scaled = t.clamp(0.0, 1.0) * segments as f32;
        let i = (scaled as usize).min(segments - 1);
        let frac = scaled - i as f32;
        self.transform[i].lerp(self.transform[i + 1], frac)
    }
}

impl Default for CurvePiece {
    fn default() -> Self {
        Self {
            a: Intercept::default(),
            b: Intercept::default(),
            c: Intercept::default(),
            level: 0,
            transform: [Point::default(); RESOLUTION + 1],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn piece(shp: f32, level: usize) -> CurvePiece {
        CurvePiece::with_level(
            Intercept::new(0.0, 0.0),
            Intercept::new(0.5, 1.0).with_sharpness(shp),
            Intercept::new(1.0, 0.0),
            level,
        )
    }

    #[test]
    fn transform_starts_and_ends_on_outer_points() {
        let p = piece(0.4, 2);
        let transform = p.transform();
        assert_eq!(transform.len(), RESOLUTION / 4 + 1);
        assert_eq!(transform[0], Point::new(0.0, 0.0));
        let last = transform[transform.len() - 1];
        assert!((last.x - 1.0).abs() < 1e-6 && last.y.abs() < 1e-6);
    }

    #[test]
    fn transform_x_is_monotonic() {
        let p = piece(1.0, 0);
        for pair in p.transform().windows(2) {
            assert!(pair[1].x >= pair[0].x);
        }
    }

    #[test]
    fn sharp_piece_peaks_near_middle_point() {
        let soft = piece(0.0, 0).point_at(0.5);
        let sharp = piece(1.0, 0).point_at(0.5);
        assert!((soft.y - 0.5).abs() < 1e-5);
        assert!(sharp.y > 0.95);
    }

    #[test]
    fn coarse_levels_agree_with_fine_on_grid_points() {
        let fine = piece(0.6, 0);
        let coarse = piece(0.6, 3);
        let t = 0.25;
        let a = fine.point_at(t);
        let b = coarse.point_at(t);
        assert!((a.x - b.x).abs() < 1e-5 && (a.y - b.y).abs() < 1e-5);
    }
}

use crate::mesh::CubeId;

/// A positioned control point extracted from the mesh for one render call.
///
/// Intercepts have no identity beyond the call: the interpolator writes
/// them fresh, the positioner adjusts them in place, and everything after
/// that only reads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intercept {
    pub x: f32,
    pub y: f32,
    /// Sharpness in [0, 1]; 0 is a smooth bend, 1 a near corner.
    pub shp: f32,
    /// x before positioning (unclamped, unwrapped).
    pub adjusted_x: f32,
    /// Cube that produced this point. `None` for synthetic padding.
    pub cube: Option<CubeId>,
    pub pad_before: bool,
    pub pad_after: bool,
    pub is_wrapped: bool,
}

impl Intercept {
    pub const fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            shp: 0.0,
            adjusted_x: x,
            cube: None,
            pad_before: false,
            pad_after: false,
            is_wrapped: false,
        }
    }

    pub const fn with_sharpness(mut self, shp: f32) -> Self {
        self.shp = shp;
        self
    }

    pub const fn with_cube(mut self, cube: CubeId) -> Self {
        self.cube = Some(cube);
        self
    }

    /// Synthetic points added around the real span by the curve builder.
    #[inline]
    pub fn is_padding(&self) -> bool {
        self.pad_before || self.pad_after
    }

    /// Copy shifted along x, used for padding and wrapping.
    pub(crate) fn shifted(&self, dx: f32) -> Self {
        Self {
            x: self.x + dx,
            adjusted_x: self.adjusted_x + dx,
            ..*self
        }
    }
}

impl Default for Intercept {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

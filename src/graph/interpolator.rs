#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    dsp::Intercept,
    error::RenderError,
    mesh::{CubeId, Dim, MorphPosition, VertCube, Vertex},
};

use super::node::{Interpolator, InterpolatorContext};

/*
Interpolators
=============

Each cube in the mesh contributes at most one intercept at the current
morph position. The three variants differ in how the cube's eight corners
are collapsed:

  Trilinear   One weighted blend of all eight corners using the cube's
              axis bounds. Cheapest; exact for axis-aligned cubes.

  Accurate    Build the two time-face poles from the real corner
              coordinates, then blend between them along time. Follows
              skewed cubes correctly.

  Pole        Build both poles and take whichever is nearer in time,
              without blending. Steps instead of morphing, but costs one
              fewer blend and never smears two shapes together.

Cubes that do not cover the morph position are skipped. Writing more
intercepts than the output slice holds is a capacity error.
*/

/// Which interpolator a front-end wires into its graph.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterpolationMode {
    #[default]
    Trilinear,
    Accurate,
    Pole,
}

pub struct TrilinearInterpolator;
pub struct AccurateInterpolator;
pub struct PoleInterpolator;

pub static TRILINEAR: TrilinearInterpolator = TrilinearInterpolator;
pub static ACCURATE: AccurateInterpolator = AccurateInterpolator;
pub static POLE: PoleInterpolator = PoleInterpolator;

impl InterpolationMode {
    /// The shared stateless stage for this mode.
    pub fn stage(self) -> &'static dyn Interpolator {
        match self {
            InterpolationMode::Trilinear => &TRILINEAR,
            InterpolationMode::Accurate => &ACCURATE,
            InterpolationMode::Pole => &POLE,
        }
    }
}

impl Interpolator for TrilinearInterpolator {
    fn run(
        &self,
        ctx: &InterpolatorContext<'_>,
        out: &mut [Intercept],
    ) -> Result<usize, RenderError> {
        extract(ctx, out, |cube, morph, wrap| cube.trilinear(morph, wrap))
    }
}

impl Interpolator for AccurateInterpolator {
    fn run(
        &self,
        ctx: &InterpolatorContext<'_>,
        out: &mut [Intercept],
    ) -> Result<usize, RenderError> {
        extract(ctx, out, |cube, morph, wrap| {
            let (low, high) = cube.poles(morph, wrap)?;
            let t = VertCube::time_progress(&low, &high, morph.time)?;
            Some(low.lerp(&high, t, wrap))
        })
    }
}

impl Interpolator for PoleInterpolator {
    fn run(
        &self,
        ctx: &InterpolatorContext<'_>,
        out: &mut [Intercept],
    ) -> Result<usize, RenderError> {
        extract(ctx, out, |cube, morph, wrap| {
            let (low, high) = cube.poles(morph, wrap)?;
            VertCube::time_progress(&low, &high, morph.time)?;
            let to_low = (morph.time - low.get(Dim::Time)).abs();
            let to_high = (high.get(Dim::Time) - morph.time).abs();
            Some(if to_low <= to_high { low } else { high })
        })
    }
}

fn extract<F>(
    ctx: &InterpolatorContext<'_>,
    out: &mut [Intercept],
    vertex_at: F,
) -> Result<usize, RenderError>
where
    F: Fn(&VertCube, &MorphPosition, bool) -> Option<Vertex>,
{
    let mesh = ctx.mesh.ok_or(RenderError::MissingMesh)?;
    let mut count = 0;

    for (index, cube) in mesh.cubes().iter().enumerate() {
        let Some(vertex) = vertex_at(cube, &ctx.morph, ctx.wrap_phases) else {
            continue;
        };
        let slot = out.get_mut(count).ok_or(RenderError::CapacityExceeded)?;
        *slot = intercept_from(&vertex, CubeId(index as u32));
        count += 1;
    }

    Ok(count)
}

fn intercept_from(vertex: &Vertex, cube: CubeId) -> Intercept {
    Intercept::new(vertex.get(Dim::Phase), vertex.get(Dim::Amp))
        .with_sharpness(vertex.get(Dim::Curve).clamp(0.0, 1.0))
        .with_cube(cube)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{Mesh, MeshSource};

    fn morphing_cube() -> VertCube {
        // Phase 0.2 / amp 0.0 at time 0, phase 0.6 / amp 1.0 at time 1.
        let mut cube = VertCube::spanning(0.2, 0.0, 0.0);
        for corner in 0..8 {
            let (time_high, red_high, blue_high) = VertCube::corner_bits(corner);
            if time_high {
                let v = cube.corner_mut(true, red_high, blue_high);
                v.set(Dim::Phase, 0.6);
                v.set(Dim::Amp, 1.0);
            }
        }
        cube
    }

    fn ctx(mesh: &dyn MeshSource, time: f32) -> InterpolatorContext<'_> {
        InterpolatorContext {
            mesh: Some(mesh),
            morph: MorphPosition::new(time, 0.5, 0.5),
            wrap_phases: false,
        }
    }

    #[test]
    fn missing_mesh_fails() {
        let ctx = InterpolatorContext {
            mesh: None,
            morph: MorphPosition::default(),
            wrap_phases: false,
        };
        let mut out = [Intercept::default(); 4];
        assert_eq!(TRILINEAR.run(&ctx, &mut out), Err(RenderError::MissingMesh));
    }

    #[test]
    fn empty_mesh_yields_zero_intercepts() {
        let mesh = Mesh::new();
        let mut out = [Intercept::default(); 4];
        assert_eq!(ACCURATE.run(&ctx(&mesh, 0.5), &mut out), Ok(0));
    }

    #[test]
    fn accurate_and_trilinear_blend_along_time() {
        let mesh = Mesh::with_cubes(vec![morphing_cube()]);
        let mut out = [Intercept::default(); 2];

        for stage in [InterpolationMode::Trilinear, InterpolationMode::Accurate] {
            assert_eq!(stage.stage().run(&ctx(&mesh, 0.25), &mut out), Ok(1));
            assert!((out[0].x - 0.3).abs() < 1e-5, "{stage:?} phase {}", out[0].x);
            assert!((out[0].y - 0.25).abs() < 1e-5);
            assert_eq!(out[0].cube, Some(CubeId(0)));
        }
    }

    #[test]
    fn pole_picks_nearest_face_without_blending() {
        let mesh = Mesh::with_cubes(vec![morphing_cube()]);
        let mut out = [Intercept::default(); 2];

        POLE.run(&ctx(&mesh, 0.3), &mut out).expect("pole run");
        assert_eq!(out[0].y, 0.0);
        POLE.run(&ctx(&mesh, 0.7), &mut out).expect("pole run");
        assert_eq!(out[0].y, 1.0);
    }

    #[test]
    fn overflowing_output_is_a_capacity_error() {
        let mesh = Mesh::from_points(&[(0.1, 0.1, 0.0), (0.2, 0.2, 0.0), (0.3, 0.3, 0.0)]);
        let mut out = [Intercept::default(); 2];
        assert_eq!(
            TRILINEAR.run(&ctx(&mesh, 0.5), &mut out),
            Err(RenderError::CapacityExceeded)
        );
    }
}

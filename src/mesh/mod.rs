//! The read-only mesh contract the rasterizer samples from.
//!
//! Editing, persistence and display of meshes live elsewhere; this module
//! only carries the value types those layers hand to a render call and a
//! plain [`Mesh`] container that implements [`MeshSource`].

/// Eight-vertex morph cells and their interpolation math.
pub mod cube;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub use cube::VertCube;

/// Number of values stored per vertex.
pub const NUM_DIMS: usize = 6;

/// Tolerance used when deciding whether a morph position lies on an axis pair.
pub(crate) const AXIS_EPSILON: f32 = 1e-6;

/// Vertex dimensions, in storage order.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dim {
    Time,
    Phase,
    Amp,
    Red,
    Blue,
    Curve,
}

impl Dim {
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// A point in the three morph axes a mesh is sampled at.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MorphPosition {
    pub time: f32,
    pub red: f32,
    pub blue: f32,
}

impl MorphPosition {
    pub const fn new(time: f32, red: f32, blue: f32) -> Self {
        Self { time, red, blue }
    }

    /// Clamp every axis into the unit cube.
    pub fn clamped(self) -> Self {
        Self {
            time: self.time.clamp(0.0, 1.0),
            red: self.red.clamp(0.0, 1.0),
            blue: self.blue.clamp(0.0, 1.0),
        }
    }
}

impl Default for MorphPosition {
    fn default() -> Self {
        Self::new(0.0, 0.5, 0.5)
    }
}

/// Non-owning handle to a cube inside the mesh that produced an intercept.
///
/// Only meaningful for the render call that created it: the mesh may be
/// replaced before the next call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CubeId(pub u32);

/// One vertex: a value for each [`Dim`].
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vertex {
    pub values: [f32; NUM_DIMS],
}

impl Vertex {
    pub const fn new(time: f32, phase: f32, amp: f32, red: f32, blue: f32, curve: f32) -> Self {
        Self {
            values: [time, phase, amp, red, blue, curve],
        }
    }

    #[inline]
    pub fn get(&self, dim: Dim) -> f32 {
        self.values[dim.index()]
    }

    #[inline]
    pub fn set(&mut self, dim: Dim, value: f32) {
        self.values[dim.index()] = value;
    }

    /// Linear blend towards `other`.
    ///
    /// With `wrap_phases` the phase takes the shorter way around the unit
    /// circle, so 0.95 → 0.05 passes through 0.0 instead of 0.5.
    pub fn lerp(&self, other: &Vertex, t: f32, wrap_phases: bool) -> Vertex {
        let mut out = *self;
        for (dst, (&a, &b)) in out
            .values
            .iter_mut()
            .zip(self.values.iter().zip(other.values.iter()))
        {
            *dst = a + (b - a) * t;
        }
        let phase = Dim::Phase.index();
        out.values[phase] = lerp_phase(self.values[phase], other.values[phase], t, wrap_phases);
        out
    }
}

#[inline]
pub(crate) fn lerp_phase(a: f32, b: f32, t: f32, wrap_phases: bool) -> f32 {
    let mut diff = b - a;
    if wrap_phases {
        if diff > 0.5 {
            diff -= 1.0;
        } else if diff < -0.5 {
            diff += 1.0;
        }
    }
    a + diff * t
}

/// Read-only view of a mesh.
///
/// Implementors guarantee that the cube list stays unchanged for the
/// duration of any render call that borrows it.
pub trait MeshSource: Send + Sync {
    fn cubes(&self) -> &[VertCube];
}

/// Owned list of vertex cubes.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    cubes: Vec<VertCube>,
}

impl Mesh {
    pub fn new() -> Self {
        Self { cubes: Vec::new() }
    }

    pub fn with_cubes(cubes: Vec<VertCube>) -> Self {
        Self { cubes }
    }

    /// Build a static mesh: one full-range cube per `(phase, amp, curve)` point.
    pub fn from_points(points: &[(f32, f32, f32)]) -> Self {
        let cubes = points
            .iter()
            .map(|&(phase, amp, curve)| VertCube::spanning(phase, amp, curve))
            .collect();
        Self { cubes }
    }

    pub fn add_cube(&mut self, cube: VertCube) -> CubeId {
        self.cubes.push(cube);
        CubeId((self.cubes.len() - 1) as u32)
    }

    pub fn len(&self) -> usize {
        self.cubes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cubes.is_empty()
    }
}

impl MeshSource for Mesh {
    fn cubes(&self) -> &[VertCube] {
        &self.cubes
    }
}

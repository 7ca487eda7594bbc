//! Low-level primitives used by the pipeline stages.
//!
//! These types are plain values with no allocation in their hot paths, so
//! they can live inside preallocated workspace buffers and voice structs.

/// Three-point curve segments and their discretised shape.
pub mod curve;
/// Process-wide shape lookup table shared by every curve piece.
pub mod curvelet;
/// Note lifecycle state machine for mesh envelopes.
pub mod envelope;
/// Control points extracted from a mesh.
pub mod intercept;

pub use curve::{CurvePiece, Point};
pub use envelope::{EnvMode, EnvStateMachine};
pub use intercept::Intercept;

//! Realtime-safe rasterization of morphable curve meshes into waveforms.
//!
//! A mesh of vertex cubes is sampled at a morph position, turned into a
//! sorted set of intercepts, bent into curve pieces through a shared
//! curvelet table, flattened into a breakpoint waveform and finally walked
//! at audio rate. Every render entry point works on a preallocated
//! [`graph::Workspace`] and never allocates.

pub mod dsp; // Allocation-free primitives: intercepts, curve pieces, envelope state
pub mod error;
pub mod graph; // Pipeline stages and the orchestrating graph
pub mod mesh;
pub mod synth; // Per-mode rasterizer front-ends and voice management

pub use error::RenderError;

pub const MAX_BLOCK_SIZE: usize = 2048;

/// Number of independent phase continuations a voice rasterizer keeps.
pub const MAX_UNISON: usize = 8;

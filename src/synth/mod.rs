// Purpose: Rasterizer front-ends, one per playback mode, plus voice management
// This layer wires graph stages together and owns all cross-call state

mod binding;
pub mod control;
pub mod env;
pub mod fx;
pub mod graphic;
pub mod message;
pub mod poly;
pub mod voice;

pub use control::{
    ControlSnapshot, EnvControlSnapshot, GraphicRequest, GraphicResult, RenderRequest,
    RenderResult,
};
pub use env::EnvRasterizer;
pub use fx::FxRasterizer;
pub use graphic::GraphicRasterizer;
pub use message::{MessageReceiver, RasterMessage};
pub use poly::{MeshSynth, SynthConfig};
pub use voice::VoiceRasterizer;

/// Wrap `phase` into `[start, end)`.
#[inline]
pub(crate) fn wrap_phase(phase: f64, start: f64, end: f64) -> f64 {
    if phase >= start && phase < end {
        return phase;
    }
    let wrapped = start + (phase - start).rem_euclid(end - start);
    // rem_euclid can round up to the full width
    if wrapped >= end {
        start
    } else {
        wrapped
    }
}

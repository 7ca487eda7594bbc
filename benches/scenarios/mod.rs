//! Front-end benchmarks.
//!
//! These render the way a host would: one block at a time through the
//! stateful rasterizers and the voice pool.

mod synth;
mod voices;

pub use synth::bench_synth;
pub use voices::bench_voices;

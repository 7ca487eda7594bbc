//! Benchmarks for the individual pipeline stages.

mod build;
mod sampler;

pub use build::bench_build_wave;
pub use sampler::bench_sampler;

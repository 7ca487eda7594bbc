//! meshscope - play and inspect a morphing curve mesh in the terminal
//!
//! Run with: cargo run --bin meshscope

mod app;
mod ui;

use app::Meshscope;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    Meshscope::new().voices(8).envelope_seconds(1.5).run()
}

//! Meshscope - audio setup and the demo meshes

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use rtrb::RingBuffer;
use std::sync::Arc;

use mesh_raster::{
    graph::CapacitySpec,
    mesh::{Dim, Mesh, MeshSource, VertCube},
    synth::{EnvControlSnapshot, MeshSynth, RasterMessage, SynthConfig},
    MAX_BLOCK_SIZE,
};

use super::ui::{ScopeState, UiApp, VIS_BUFFER_SIZE};

/// Main application builder
pub struct Meshscope {
    voices: usize,
    envelope_seconds: f32,
}

impl Meshscope {
    pub fn new() -> Self {
        Self {
            voices: 8,
            envelope_seconds: 2.0,
        }
    }

    /// Size of the voice pool
    pub fn voices(mut self, voices: usize) -> Self {
        self.voices = voices.max(1);
        self
    }

    /// Time the envelope takes to cross its axis
    pub fn envelope_seconds(mut self, seconds: f32) -> Self {
        self.envelope_seconds = seconds;
        self
    }

    /// Run the application (takes over the terminal, plays audio)
    pub fn run(self) -> EyreResult<()> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| eyre!("no default output device available"))?;
        let config = device
            .default_output_config()
            .wrap_err("failed to fetch default output config")?;

        let sample_rate = config.sample_rate().0 as f32;
        let channels = config.channels() as usize;

        let wave_mesh: Arc<dyn MeshSource> = Arc::new(demo_wave_mesh());
        let env_mesh: Arc<dyn MeshSource> = Arc::new(demo_env_mesh());

        let (mut msg_tx, msg_rx) = RingBuffer::<RasterMessage>::new(256);
        let (mut audio_tx, audio_rx) = RingBuffer::<f32>::new(VIS_BUFFER_SIZE * 8);

        let mut synth = MeshSynth::new(
            SynthConfig {
                sample_rate,
                max_voices: self.voices,
                capacity: CapacitySpec::for_intercepts(32),
                envelope_seconds: self.envelope_seconds,
                ..SynthConfig::default()
            },
            msg_rx,
        );
        synth.set_meshes(wave_mesh.clone(), env_mesh);
        msg_tx
            .push(RasterMessage::EnvControls(demo_env_controls()))
            .map_err(|_| eyre!("control queue full before start"))?;

        let mut render_buf = vec![0.0f32; MAX_BLOCK_SIZE];
        let stream = device.build_output_stream(
            &config.into(),
            move |data: &mut [f32], _| {
                let total_frames = data.len() / channels;
                let mut frames_written = 0;

                while frames_written < total_frames {
                    let frames_to_render = (total_frames - frames_written).min(MAX_BLOCK_SIZE);
                    let block = &mut render_buf[..frames_to_render];
                    synth.render_block(block);

                    // Copy to output (mono to all channels)
                    let out_off = frames_written * channels;
                    for (i, &s) in block.iter().enumerate() {
                        for ch in 0..channels {
                            data[out_off + i * channels + ch] = s;
                        }
                        // Scope is best effort; drop samples when the UI lags
                        let _ = audio_tx.push(s);
                    }

                    frames_written += frames_to_render;
                }
            },
            |err| eprintln!("Audio error: {}", err),
            None,
        )?;
        stream.play()?;

        let mut terminal = ratatui::init();
        let state = ScopeState::new(sample_rate);
        let result = UiApp::new(audio_rx, msg_tx, wave_mesh, state).and_then(|mut app| {
            app.run(&mut terminal)
        });
        ratatui::restore();
        result
    }
}

impl Default for Meshscope {
    fn default() -> Self {
        Self::new()
    }
}

/// A cube whose shape moves from `low` to `high` along the red axis.
fn red_morph(low: (f32, f32, f32), high: (f32, f32, f32)) -> VertCube {
    let mut cube = VertCube::spanning(low.0, low.1, low.2);
    for time_high in [false, true] {
        for blue_high in [false, true] {
            let vertex = cube.corner_mut(time_high, true, blue_high);
            vertex.set(Dim::Phase, high.0);
            vertex.set(Dim::Amp, high.1);
            vertex.set(Dim::Curve, high.2);
        }
    }
    cube
}

/// Rounded pulse on the red-low face, a sharp ramp on the red-high face.
fn demo_wave_mesh() -> Mesh {
    Mesh::with_cubes(vec![
        red_morph((0.0, 0.5, 0.2), (0.02, 0.0, 0.0)),
        red_morph((0.25, 1.0, 0.4), (0.5, 0.5, 0.0)),
        red_morph((0.5, 0.5, 0.2), (0.97, 1.0, 0.9)),
        red_morph((0.75, 0.0, 0.4), (0.99, 0.5, 0.0)),
    ])
}

/// Attack, decay to a sustain plateau, release.
fn demo_env_mesh() -> Mesh {
    Mesh::from_points(&[
        (0.0, 0.0, 0.0),
        (0.08, 1.0, 0.6),
        (0.35, 0.6, 0.2),
        (0.7, 0.6, 0.0),
        (1.0, 0.0, 0.3),
    ])
}

/// Sustain by looping the plateau; note-off jumps to the release section.
fn demo_env_controls() -> EnvControlSnapshot {
    EnvControlSnapshot {
        loop_enabled: true,
        loop_start: 0.35,
        loop_end: 0.7,
        has_release_curve: true,
        release_start_x: 0.7,
        ..EnvControlSnapshot::default()
    }
}

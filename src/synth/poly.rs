use std::sync::Arc;

use crate::{
    graph::CapacitySpec,
    mesh::{MeshSource, MorphPosition},
    MAX_BLOCK_SIZE,
};

use super::{
    control::{ControlSnapshot, EnvControlSnapshot, RenderRequest},
    env::EnvRasterizer,
    message::{MessageReceiver, RasterMessage},
    voice::VoiceRasterizer,
};

/// Setup for a [`MeshSynth`]. Everything here is fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynthConfig {
    pub sample_rate: f32,
    pub max_voices: usize,
    pub capacity: CapacitySpec,
    /// Seconds the envelope takes to cross its whole axis.
    pub envelope_seconds: f32,
    /// Master gain applied to the voice mix.
    pub gain: f32,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000.0,
            max_voices: 8,
            capacity: CapacitySpec::for_intercepts(32),
            envelope_seconds: 2.0,
            gain: 0.25,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    Free,      // Available for allocation
    Active,    // Playing, envelope in Normal or Looping
    Releasing, // Key released, envelope running its release section
}

/// A wave rasterizer gated by an envelope rasterizer.
pub struct MeshVoice {
    note: u8,
    velocity: u8,
    state: VoiceState,
    age: u64,
    wave: VoiceRasterizer,
    env: EnvRasterizer,
}

impl MeshVoice {
    fn new(capacity: CapacitySpec) -> Self {
        let mut wave = VoiceRasterizer::new(capacity);
        let mut env = EnvRasterizer::new(capacity);
        if !(wave.prepare() && env.prepare()) {
            log::warn!("voice workspace could not be prepared for {capacity:?}");
        }
        Self {
            note: 0,
            velocity: 0,
            state: VoiceState::Free,
            age: 0,
            wave,
            env,
        }
    }

    pub fn start(&mut self, note: u8, velocity: u8, age: u64) {
        self.note = note;
        self.velocity = velocity;
        self.state = VoiceState::Active;
        self.age = age;
        self.wave.note_on();
        self.env.note_on();
    }

    /// Without a release section there is nothing left to play.
    pub fn release(&mut self) {
        if self.state == VoiceState::Active {
            if self.env.note_off() {
                self.state = VoiceState::Releasing;
            } else {
                self.free();
            }
        }
    }

    /// Render wave × envelope into `out`, using `scratch` for the envelope.
    fn render(&mut self, out: &mut [f32], scratch: &mut [f32], wave_delta: f64, env_delta: f64) {
        let n = out.len();
        let wave = self.wave.render_audio(&RenderRequest::new(n, wave_delta), out);
        let env = self
            .env
            .render_audio(&RenderRequest::new(n, env_delta), &mut scratch[..n]);

        if !wave.rendered || !env.rendered {
            out.fill(0.0);
        } else {
            let level = self.velocity as f32 / 127.0;
            for (o, e) in out.iter_mut().zip(scratch.iter()) {
                *o *= e * level;
            }
        }

        // Envelope finished its release section
        if self.state == VoiceState::Releasing && !env.still_active {
            self.free();
        }
    }

    pub fn is_free(&self) -> bool {
        self.state == VoiceState::Free
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, VoiceState::Active | VoiceState::Releasing)
    }

    pub fn free(&mut self) {
        self.state = VoiceState::Free;
        self.note = 0;
        self.velocity = 0;
    }

    pub fn note(&self) -> u8 {
        self.note
    }

    pub fn age(&self) -> u64 {
        self.age
    }

    pub fn state(&self) -> VoiceState {
        self.state
    }
}

/// Fixed pool of mesh voices driven by [`RasterMessage`]s.
pub struct MeshSynth<R: MessageReceiver> {
    config: SynthConfig,
    voices: Vec<MeshVoice>,
    rx: R,
    voice_controls: ControlSnapshot,
    env_controls: EnvControlSnapshot,
    mix_buffer: Vec<f32>,
    env_buffer: Vec<f32>,
    frame_counter: u64,
}

impl<R: MessageReceiver> MeshSynth<R> {
    /// Build the pool and prepare every workspace. Not realtime safe.
    pub fn new(config: SynthConfig, rx: R) -> Self {
        let voices = (0..config.max_voices)
            .map(|_| MeshVoice::new(config.capacity))
            .collect();
        log::info!(
            "mesh synth: {} voices at {} Hz",
            config.max_voices,
            config.sample_rate
        );

        let mut synth = Self {
            config,
            voices,
            rx,
            voice_controls: ControlSnapshot::cyclic(),
            env_controls: EnvControlSnapshot::default(),
            mix_buffer: vec![0.0; MAX_BLOCK_SIZE],
            env_buffer: vec![0.0; MAX_BLOCK_SIZE],
            frame_counter: 0,
        };
        synth.apply_voice_controls();
        synth.apply_env_controls();
        synth
    }

    /// Bind the wave and envelope meshes on every voice. Call off the audio
    /// thread, or between blocks.
    pub fn set_meshes(&mut self, wave: Arc<dyn MeshSource>, env: Arc<dyn MeshSource>) {
        for voice in &mut self.voices {
            voice.wave.set_mesh_snapshot(Some(wave.clone()));
            voice.env.set_mesh_snapshot(Some(env.clone()));
        }
    }

    pub fn config(&self) -> &SynthConfig {
        &self.config
    }

    pub fn voices(&self) -> &[MeshVoice] {
        &self.voices
    }

    /// The message source, e.g. to queue events from a test or a sequencer
    /// running on the audio thread.
    pub fn receiver_mut(&mut self) -> &mut R {
        &mut self.rx
    }

    pub fn active_voices(&self) -> usize {
        self.voices.iter().filter(|v| v.is_active()).count()
    }

    pub fn render_block(&mut self, out: &mut [f32]) {
        while let Some(msg) = self.rx.pop() {
            self.handle(msg);
        }

        for chunk in out.chunks_mut(MAX_BLOCK_SIZE) {
            self.render_chunk(chunk);
        }
    }

    fn handle(&mut self, msg: RasterMessage) {
        match msg {
            RasterMessage::NoteOn { note, velocity } => {
                let age = self.frame_counter;
                if let Some(voice) = self.allocate_voice() {
                    voice.start(note, velocity, age);
                }
            }
            RasterMessage::NoteOff { note } => {
                if let Some(voice) = self.find_voice(note) {
                    voice.release();
                }
            }
            RasterMessage::AllNotesOff => {
                for voice in &mut self.voices {
                    voice.release();
                }
            }
            RasterMessage::VoiceControls(controls) => {
                self.voice_controls = controls;
                self.apply_voice_controls();
            }
            RasterMessage::EnvControls(controls) => {
                self.env_controls = controls;
                self.apply_env_controls();
            }
            RasterMessage::Morph(morph) => self.set_morph(morph),
        }
    }

    fn set_morph(&mut self, morph: MorphPosition) {
        let morph = morph.clamped();
        self.voice_controls.morph = morph;
        self.env_controls.base.morph = morph;
        self.apply_voice_controls();
        self.apply_env_controls();
    }

    fn apply_voice_controls(&mut self) {
        for voice in &mut self.voices {
            voice.wave.update_control_data(self.voice_controls);
        }
    }

    fn apply_env_controls(&mut self) {
        for voice in &mut self.voices {
            voice.env.update_control_data(self.env_controls);
        }
    }

    fn render_chunk(&mut self, out: &mut [f32]) {
        let n = out.len();
        let sample_rate = self.config.sample_rate.max(1.0) as f64;
        let cycle = (self.voice_controls.max_x - self.voice_controls.min_x) as f64;
        let env_span = (self.env_controls.base.max_x - self.env_controls.base.min_x) as f64;
        let env_delta = env_span / (self.config.envelope_seconds.max(1e-3) as f64 * sample_rate);

        out.fill(0.0);
        for voice in &mut self.voices {
            if voice.is_active() {
                let wave_delta = note_frequency(voice.note) * cycle / sample_rate;
                let mix = &mut self.mix_buffer[..n];
                mix.fill(0.0);
                voice.render(mix, &mut self.env_buffer, wave_delta, env_delta);

                for (o, v) in out.iter_mut().zip(mix.iter()) {
                    *o += v * self.config.gain;
                }
            }
        }

        self.frame_counter += n as u64;
    }

    /// A free slot if there is one, otherwise the releasing voice that
    /// started longest ago. Held notes are never stolen.
    fn allocate_voice(&mut self) -> Option<&mut MeshVoice> {
        let slot = self
            .voices
            .iter()
            .position(MeshVoice::is_free)
            .or_else(|| self.oldest_releasing())?;
        self.voices.get_mut(slot)
    }

    fn oldest_releasing(&self) -> Option<usize> {
        self.voices
            .iter()
            .enumerate()
            .filter(|(_, v)| v.state() == VoiceState::Releasing)
            .min_by_key(|(_, v)| v.age())
            .map(|(slot, _)| slot)
    }

    fn find_voice(&mut self, note: u8) -> Option<&mut MeshVoice> {
        self.voices
            .iter_mut()
            .find(|v| v.note() == note && v.state() == VoiceState::Active)
    }
}

/// Equal-tempered frequency of a MIDI note, A4 = 440 Hz.
#[inline]
pub fn note_frequency(note: u8) -> f64 {
    440.0 * 2f64.powf((note as f64 - 69.0) / 12.0)
}

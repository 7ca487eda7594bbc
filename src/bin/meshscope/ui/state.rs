//! Editor-side state: what the keyboard has changed so far
//!
//! Every change produces a `RasterMessage` for the audio thread and updated
//! controls for the UI's own graphic rasterizer.

use mesh_raster::{
    graph::InterpolationMode,
    mesh::MorphPosition,
    synth::{ControlSnapshot, RasterMessage},
};

/// Keyboard row mapped to a C major scale from middle C
pub const KEY_NOTES: [(char, u8); 8] = [
    ('a', 60),
    ('s', 62),
    ('d', 64),
    ('f', 65),
    ('g', 67),
    ('h', 69),
    ('j', 71),
    ('k', 72),
];

const MORPH_STEP: f32 = 0.05;

pub struct ScopeState {
    pub sample_rate: f32,
    pub morph: MorphPosition,
    pub interpolation: InterpolationMode,
    pub low_resolution: bool,
    held: [bool; 128],
}

impl ScopeState {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            morph: MorphPosition::default(),
            interpolation: InterpolationMode::Trilinear,
            low_resolution: false,
            held: [false; 128],
        }
    }

    /// Wave controls matching the current editor state
    pub fn voice_controls(&self) -> ControlSnapshot {
        ControlSnapshot {
            interpolation: self.interpolation,
            low_resolution: self.low_resolution,
            morph: self.morph,
            ..ControlSnapshot::cyclic()
        }
    }

    /// Press or release the note bound to `key`
    pub fn toggle_key(&mut self, key: char) -> Option<RasterMessage> {
        let note = KEY_NOTES
            .iter()
            .find(|(k, _)| *k == key.to_ascii_lowercase())
            .map(|&(_, note)| note)?;
        let held = &mut self.held[note as usize];
        *held = !*held;
        Some(if *held {
            RasterMessage::NoteOn {
                note,
                velocity: 100,
            }
        } else {
            RasterMessage::NoteOff { note }
        })
    }

    pub fn release_all(&mut self) -> RasterMessage {
        self.held = [false; 128];
        RasterMessage::AllNotesOff
    }

    pub fn held_notes(&self) -> impl Iterator<Item = u8> + '_ {
        self.held
            .iter()
            .enumerate()
            .filter(|(_, &held)| held)
            .map(|(note, _)| note as u8)
    }

    pub fn nudge_morph(&mut self, time: f32, red: f32, blue: f32) -> RasterMessage {
        self.morph = MorphPosition::new(
            self.morph.time + time * MORPH_STEP,
            self.morph.red + red * MORPH_STEP,
            self.morph.blue + blue * MORPH_STEP,
        )
        .clamped();
        RasterMessage::Morph(self.morph)
    }

    pub fn cycle_interpolation(&mut self) -> RasterMessage {
        self.interpolation = match self.interpolation {
            InterpolationMode::Trilinear => InterpolationMode::Accurate,
            InterpolationMode::Accurate => InterpolationMode::Pole,
            InterpolationMode::Pole => InterpolationMode::Trilinear,
        };
        RasterMessage::VoiceControls(self.voice_controls())
    }

    pub fn toggle_low_resolution(&mut self) -> RasterMessage {
        self.low_resolution = !self.low_resolution;
        RasterMessage::VoiceControls(self.voice_controls())
    }
}

#[cfg(feature = "rtrb")]
use rtrb::Consumer;

use crate::mesh::MorphPosition;

use super::control::{ControlSnapshot, EnvControlSnapshot};

/// Events the UI or MIDI thread sends to the audio thread.
#[derive(Debug, Copy, Clone)]
pub enum RasterMessage {
    NoteOn { note: u8, velocity: u8 },
    NoteOff { note: u8 },
    AllNotesOff,
    /// Replace the wave controls of every voice.
    VoiceControls(ControlSnapshot),
    /// Replace the envelope controls of every voice.
    EnvControls(EnvControlSnapshot),
    /// Move every voice's wave and envelope to a new morph position.
    Morph(MorphPosition),
}

pub trait MessageReceiver {
    fn pop(&mut self) -> Option<RasterMessage>;
}

#[cfg(feature = "rtrb")]
impl MessageReceiver for Consumer<RasterMessage> {
    fn pop(&mut self) -> Option<RasterMessage> {
        Consumer::pop(self).ok()
    }
}

//! Voice allocation in the polyphonic mesh synth.

use std::collections::VecDeque;
use std::sync::Arc;

use mesh_raster::{
    graph::CapacitySpec,
    mesh::{Mesh, MeshSource, MorphPosition},
    synth::{
        poly::VoiceState, EnvControlSnapshot, MeshSynth, MessageReceiver, RasterMessage,
        SynthConfig,
    },
};

/// Messages queued by the test, drained by the synth.
#[derive(Default)]
struct Inbox(VecDeque<RasterMessage>);

impl MessageReceiver for Inbox {
    fn pop(&mut self) -> Option<RasterMessage> {
        self.0.pop_front()
    }
}

fn synth(voices: usize, messages: Vec<RasterMessage>) -> MeshSynth<Inbox> {
    let config = SynthConfig {
        sample_rate: 1_000.0,
        max_voices: voices,
        capacity: CapacitySpec::for_intercepts(8),
        envelope_seconds: 1.0,
        gain: 1.0,
    };
    let mut synth = MeshSynth::new(config, Inbox(messages.into()));
    let wave: Arc<dyn MeshSource> = Arc::new(Mesh::from_points(&[
        (0.0, 1.0, 0.0),
        (0.5, 0.0, 0.0),
    ]));
    let env: Arc<dyn MeshSource> = Arc::new(Mesh::from_points(&[
        (0.0, 0.0, 0.0),
        (0.1, 1.0, 1.0),
        (0.9, 1.0, 1.0),
        (1.0, 0.0, 1.0),
    ]));
    synth.set_meshes(wave, env);
    synth
}

fn note_on(note: u8) -> RasterMessage {
    RasterMessage::NoteOn {
        note,
        velocity: 127,
    }
}

fn releasing_env() -> RasterMessage {
    RasterMessage::EnvControls(EnvControlSnapshot {
        has_release_curve: true,
        release_start_x: 0.9,
        ..EnvControlSnapshot::default()
    })
}

#[test]
fn notes_take_free_voices_first() {
    let mut synth = synth(4, vec![note_on(60), note_on(64), note_on(67)]);
    let mut out = [0.0f32; 64];
    synth.render_block(&mut out);

    assert_eq!(synth.active_voices(), 3);
    let notes: Vec<u8> = synth
        .voices()
        .iter()
        .filter(|v| v.is_active())
        .map(|v| v.note())
        .collect();
    assert_eq!(notes, vec![60, 64, 67]);
    assert!(out.iter().any(|s| s.abs() > 0.0));
}

#[test]
fn full_pool_steals_the_oldest_releasing_voice() {
    let mut synth = synth(2, vec![releasing_env(), note_on(60)]);
    let mut out = [0.0f32; 16];
    synth.render_block(&mut out);

    // Second note arrives a block later so the voices differ in age
    synth.receiver_mut().0.push_back(note_on(62));
    synth.render_block(&mut out);

    synth.receiver_mut().0.extend([
        RasterMessage::NoteOff { note: 60 },
        RasterMessage::NoteOff { note: 62 },
    ]);
    synth.render_block(&mut out);
    assert!(synth
        .voices()
        .iter()
        .all(|v| v.state() == VoiceState::Releasing));

    synth.receiver_mut().0.push_back(note_on(70));
    synth.render_block(&mut out);

    let notes: Vec<u8> = synth.voices().iter().map(|v| v.note()).collect();
    assert!(notes.contains(&70));
    assert!(notes.contains(&62), "the younger releasing voice survives: {notes:?}");
}

#[test]
fn held_notes_are_never_stolen() {
    let mut synth = synth(2, vec![note_on(60), note_on(62), note_on(64)]);
    let mut out = [0.0f32; 16];
    synth.render_block(&mut out);

    let notes: Vec<u8> = synth.voices().iter().map(|v| v.note()).collect();
    assert_eq!(notes, vec![60, 62]);
    assert_eq!(synth.active_voices(), 2);
}

#[test]
fn note_off_without_release_frees_at_once() {
    let mut synth = synth(2, vec![note_on(60), RasterMessage::NoteOff { note: 60 }]);
    let mut out = [0.0f32; 16];
    synth.render_block(&mut out);
    assert_eq!(synth.active_voices(), 0);
    assert!(out.iter().all(|&s| s == 0.0));
}

#[test]
fn released_voice_frees_itself_when_the_envelope_ends() {
    let mut synth = synth(1, vec![releasing_env(), note_on(60)]);
    let mut out = [0.0f32; 50];
    synth.render_block(&mut out);

    synth.receiver_mut().0.push_back(RasterMessage::NoteOff { note: 60 });
    synth.render_block(&mut out);
    assert_eq!(synth.voices()[0].state(), VoiceState::Releasing);

    // 0.9 → 1.0 at 1/1000 per sample takes 100 samples
    synth.render_block(&mut out);
    synth.render_block(&mut out);
    assert!(synth.voices()[0].is_free());
}

#[test]
fn all_notes_off_and_morph_reach_every_voice() {
    let mut synth = synth(
        3,
        vec![
            releasing_env(),
            note_on(60),
            note_on(61),
            RasterMessage::Morph(MorphPosition::new(2.0, -1.0, 0.5)),
            RasterMessage::AllNotesOff,
        ],
    );
    let mut out = [0.0f32; 8];
    synth.render_block(&mut out);

    let states: Vec<VoiceState> = synth.voices().iter().map(|v| v.state()).collect();
    assert_eq!(
        states,
        vec![VoiceState::Releasing, VoiceState::Releasing, VoiceState::Free]
    );
}

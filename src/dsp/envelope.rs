/*
Envelope Lifecycle
==================

A mesh envelope does not compute its level from attack/decay/release
times. Its shape is a rasterized curve, and the only thing that changes
over a note's life is WHERE on that curve the playhead sits. This module
owns the small state machine deciding that.

Vocabulary
----------

  mode            Normal, Looping or Releasing.

  loop region     [loop_start, loop_end) on the envelope's x axis. While
                  Looping, the playhead wraps inside it instead of running
                  past loop_end.

  release curve   The part of the envelope after release_start_x. When a
                  note is released the playhead jumps there.

  release trigger A one-shot flag raised by note_off and consumed by the
                  renderer, which performs the jump exactly once.


The State Machine
-----------------

    ┌────────┐ transition_to_looping ┌─────────┐
    │ Normal │ ────────────────────→ │ Looping │
    └────────┘  (can_loop &&         └─────────┘
        │        overextends)             │
        │ note_off(true)                  │ note_off(true)
        ↓                                 ↓
    ┌─────────────────────────────────────────┐
    │               Releasing                 │
    └─────────────────────────────────────────┘

note_on returns to Normal from anywhere. There is no terminal state: the
voice owning the machine decides when it is finished.

Misuse is reported through boolean returns rather than panics. A second
note_off while Releasing, or a loop request from Looping, simply returns
false and leaves the machine alone.
*/

/// Where an envelope voice is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnvMode {
    #[default]
    Normal, // Playhead runs forward from the start
    Looping,   // Playhead wraps inside the loop region
    Releasing, // Playhead runs through the release curve
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EnvStateMachine {
    mode: EnvMode,
    release_pending: bool,
}

impl EnvStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a note: back to Normal, forget any unconsumed release.
    pub fn note_on(&mut self) {
        self.mode = EnvMode::Normal;
        self.release_pending = false;
    }

    /// Release the note. Returns false when already releasing or when the
    /// envelope has no release curve to jump to.
    pub fn note_off(&mut self, has_release_curve: bool) -> bool {
        if self.mode == EnvMode::Releasing || !has_release_curve {
            return false;
        }
        self.mode = EnvMode::Releasing;
        self.release_pending = true;
        true
    }

    /// Enter the loop region. Only allowed from Normal, and only when the
    /// region is usable and the playhead has run past its end.
    pub fn transition_to_looping(&mut self, can_loop: bool, overextends: bool) -> bool {
        if self.mode != EnvMode::Normal || !can_loop || !overextends {
            return false;
        }
        self.mode = EnvMode::Looping;
        true
    }

    /// Fire-once release flag.
    pub fn consume_release_trigger(&mut self) -> bool {
        std::mem::take(&mut self.release_pending)
    }

    pub fn mode(&self) -> EnvMode {
        self.mode
    }

    pub fn release_pending(&self) -> bool {
        self.release_pending
    }
}

//! Whole-playlist runs
//!
//! A [`PlaylistRun`] walks the ring from head and yields one
//! [`PlaybackEvent::SongStarted`] per song. With continuous play off it stops
//! after one rotation. With continuous play on it plays a batch of
//! rotations, yields [`PlaybackEvent::BatchCompleted`] and pauses until the
//! caller asks for another batch with [`PlaylistRun::next_batch`].
//!
//! ```text
//! off:  A B C ─ Rotation(1) ─ end
//! on:   A B C ─ Rotation(1) ─ A B C ─ Rotation(2) ─ A B C ─ Rotation(3)
//!       ─ Batch(1) ─ (paused) ── next_batch() ──► A B C ...
//! ```
//!
//! The run never waits and never reads input; timing and the "another
//! batch?" question belong to the caller.

use crate::events::PlaybackEvent;
use crate::ring::{NodeId, Ring};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    Playing,
    RotationDone,
    BatchDone,
    AwaitingDecision,
    Finished,
}

/// Lazy sequence of playback events over one ring
#[derive(Debug, Clone)]
pub struct PlaylistRun<'a> {
    ring: &'a Ring,
    continuous: bool,
    batch_repetitions: u32,

    /// Node to yield next while `Playing`
    next: Option<NodeId>,

    /// 1-based position of `next`
    position: usize,

    rotations: u32,
    rotations_in_batch: u32,
    batches: u32,
    state: RunState,
}

impl<'a> PlaylistRun<'a> {
    /// Start a run at the ring's head
    ///
    /// A `batch_repetitions` of zero is treated as one.
    pub fn new(ring: &'a Ring, continuous: bool, batch_repetitions: u32) -> Self {
        let state = if ring.is_empty() {
            RunState::Finished
        } else {
            RunState::Playing
        };

        Self {
            ring,
            continuous,
            batch_repetitions: batch_repetitions.max(1),
            next: ring.head(),
            position: 1,
            rotations: 0,
            rotations_in_batch: 0,
            batches: 0,
            state,
        }
    }

    /// Whether the run paused at the end of a continuous batch
    pub fn awaiting_decision(&self) -> bool {
        self.state == RunState::AwaitingDecision
    }

    /// Whether the run has ended for good
    pub fn is_finished(&self) -> bool {
        self.state == RunState::Finished
    }

    /// Resume after a finished batch
    ///
    /// Returns `false` (and does nothing) unless the run is paused at a
    /// batch boundary.
    pub fn next_batch(&mut self) -> bool {
        if self.state != RunState::AwaitingDecision {
            return false;
        }
        self.rotations_in_batch = 0;
        self.restart_rotation();
        true
    }

    /// Stop the run; later calls to `next` yield nothing
    pub fn finish(&mut self) {
        self.state = RunState::Finished;
    }

    /// Rotations finished so far
    pub fn rotations(&self) -> u32 {
        self.rotations
    }

    /// Batches finished so far
    pub fn batches(&self) -> u32 {
        self.batches
    }

    fn restart_rotation(&mut self) {
        self.next = self.ring.head();
        self.position = 1;
        self.state = RunState::Playing;
    }

    fn play_current(&mut self) -> Option<PlaybackEvent> {
        let Some(id) = self.next else {
            self.state = RunState::Finished;
            return None;
        };
        let Some(song) = self.ring.get(id) else {
            self.state = RunState::Finished;
            return None;
        };

        let event = PlaybackEvent::SongStarted {
            position: self.position,
            song: song.clone(),
        };

        if self.position >= self.ring.len() {
            self.state = RunState::RotationDone;
        } else {
            self.position += 1;
            self.next = self.ring.next_id(id);
        }

        Some(event)
    }

    fn complete_rotation(&mut self) -> PlaybackEvent {
        self.rotations += 1;
        self.rotations_in_batch += 1;

        if !self.continuous {
            self.state = RunState::Finished;
        } else if self.rotations_in_batch >= self.batch_repetitions {
            self.state = RunState::BatchDone;
        } else {
            self.restart_rotation();
        }

        PlaybackEvent::RotationCompleted {
            rotation: self.rotations,
        }
    }
}

impl Iterator for PlaylistRun<'_> {
    type Item = PlaybackEvent;

    fn next(&mut self) -> Option<Self::Item> {
        match self.state {
            RunState::Playing => self.play_current(),
            RunState::RotationDone => Some(self.complete_rotation()),
            RunState::BatchDone => {
                self.batches += 1;
                self.state = RunState::AwaitingDecision;
                Some(PlaybackEvent::BatchCompleted {
                    batch: self.batches,
                })
            }
            RunState::AwaitingDecision | RunState::Finished => None,
        }
    }
}

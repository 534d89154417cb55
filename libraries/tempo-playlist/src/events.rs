//! Playback events
//!
//! Emitted in two ways:
//! - Yielded lazily by [`PlaylistRun`](crate::PlaylistRun) during a
//!   whole-playlist play-through
//! - Queued by [`Playlist`](crate::Playlist) edits and cursor moves, collected
//!   with `drain_events`

use crate::types::Song;
use serde::{Deserialize, Serialize};

/// Events emitted by the playlist engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackEvent {
    /// A song started playing
    SongStarted {
        /// 1-based position of the song in the ring
        position: usize,
        /// The song now playing
        song: Song,
    },

    /// One full rotation (head back to head) finished
    RotationCompleted {
        /// Rotations finished so far in this run, starting at 1
        rotation: u32,
    },

    /// A continuous batch finished; the caller decides whether to go on
    BatchCompleted {
        /// Batches finished so far in this run, starting at 1
        batch: u32,
    },

    /// Stepped forward past the tail with continuous play off
    EndOfPlaylist,

    /// Stepped backward past the head with continuous play off
    StartOfPlaylist,

    /// Continuous play was switched on or off
    ContinuousPlayChanged {
        /// New state of the flag
        enabled: bool,
    },

    /// The playing song was removed and the cursor went idle
    CursorReleased {
        /// The removed song
        song: Song,
    },

    /// The ring was reordered
    Shuffled {
        /// Songs in the ring
        len: usize,
    },
}

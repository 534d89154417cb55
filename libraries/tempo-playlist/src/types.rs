//! Core types for the playlist engine

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// A playable item
///
/// Songs are never edited in place. Changing a song means removing its node
/// and inserting a new one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    /// Song title
    pub title: String,

    /// Artist name
    pub artist: String,

    /// Song duration (whole seconds)
    pub duration: Duration,
}

impl Song {
    /// Create a song from a title, an artist and a length in seconds
    pub fn new(title: impl Into<String>, artist: impl Into<String>, duration_secs: u64) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            duration: Duration::from_secs(duration_secs),
        }
    }

    /// Case-insensitive title comparison used by bulk removal
    ///
    /// Compares character by character, so context-dependent lowercasing
    /// (a final sigma) never makes two equal titles differ.
    pub fn title_matches(&self, title: &str) -> bool {
        self.title.chars().count() == title.chars().count()
            && self.title.chars().zip(title.chars()).all(|(a, b)| chars_match(a, b))
    }
}

fn chars_match(a: char, b: char) -> bool {
    a == b || a.to_uppercase().eq(b.to_uppercase()) || a.to_lowercase().eq(b.to_lowercase())
}

impl fmt::Display for Song {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} by {} ({} seconds)",
            self.title,
            self.artist,
            self.duration.as_secs()
        )
    }
}

/// Where the playback cursor sits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CursorState {
    /// Nothing is playing
    Idle,

    /// The song at this 1-based position is playing
    Playing { position: usize },
}

/// How a simulated playback wait ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaitOutcome {
    /// The full duration elapsed
    Completed,

    /// The wait was cut short through a cancel handle
    Cancelled,
}

/// Result of a single `play_next` / `play_previous` step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackReport {
    /// The cursor moved onto a song and its playback wait ran
    NowPlaying {
        position: usize,
        song: Song,
        wait: WaitOutcome,
    },

    /// Stepped forward past the tail with continuous play off
    EndOfPlaylist,

    /// Stepped backward past the head with continuous play off
    StartOfPlaylist,
}

/// Result of removing songs by title
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemovalOutcome {
    /// This many songs matched and were removed
    Removed(usize),

    /// No song carried the title
    NotFound,
}

/// Summary returned by a whole-playlist play-through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlaythroughSummary {
    /// Songs started
    pub songs_played: usize,

    /// Full rotations finished
    pub rotations: u32,

    /// Continuous batches finished
    pub batches: u32,

    /// Whether a playback wait was cancelled
    pub cancelled: bool,
}

/// Configuration for a playlist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistConfig {
    /// Start with continuous play enabled (default: false)
    pub continuous_play: bool,

    /// Rotations per continuous batch before asking to go on (default: 3)
    pub batch_repetitions: u32,
}

impl Default for PlaylistConfig {
    fn default() -> Self {
        Self {
            continuous_play: false,
            batch_repetitions: 3,
        }
    }
}

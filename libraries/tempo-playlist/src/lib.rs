//! Tempo - Circular Playlist Engine
//!
//! An ordered, editable playlist stored as a circular doubly linked ring,
//! with an independent playback cursor.
//!
//! This crate provides:
//! - Positional insert and remove (1-based, always walked from head)
//! - Case-insensitive bulk removal by title
//! - Fisher-Yates shuffle that rebuilds the ring and keeps node identity
//! - Forward/backward playback with optional continuous (wrap-around) play
//! - Lazy whole-playlist runs, batched when continuous play is on
//! - A cancellable simulated playback wait
//!
//! # Architecture
//!
//! Nodes live in an arena and link by index ([`Ring`]); the cursor is an
//! optional generational handle ([`NodeId`]), so removing the playing song can
//! never leave a dangling cursor. Waiting is delegated to a
//! [`PlaybackTimer`], which lets callers swap real-time waits for instant
//! ones.
//!
//! No console I/O happens here. Menus, prompts and input parsing belong to
//! the caller.
//!
//! # Example: Editing
//!
//! ```rust
//! use tempo_playlist::{InstantTimer, Playlist, PlaylistConfig};
//! use std::time::Duration;
//!
//! let mut playlist = Playlist::with_timer(PlaylistConfig::default(), Box::new(InstantTimer));
//!
//! playlist.add_song("A", "X", 10);
//! playlist.add_song("B", "Y", 20);
//! playlist.add_song_at_position("Intro", "X", 5, 1).unwrap();
//!
//! let titles: Vec<&str> = playlist
//!     .display_playlist()
//!     .iter()
//!     .map(|song| song.title.as_str())
//!     .collect();
//! assert_eq!(titles, ["Intro", "A", "B"]);
//! assert_eq!(playlist.total_duration(), Duration::from_secs(35));
//! ```
//!
//! # Example: Playback
//!
//! ```rust
//! use tempo_playlist::{InstantTimer, PlaybackReport, Playlist, PlaylistConfig};
//!
//! let mut playlist = Playlist::with_timer(PlaylistConfig::default(), Box::new(InstantTimer));
//! playlist.add_song("A", "X", 10);
//!
//! assert!(matches!(playlist.play_next(), Ok(PlaybackReport::NowPlaying { .. })));
//! assert_eq!(playlist.play_next(), Ok(PlaybackReport::EndOfPlaylist));
//!
//! // Continuous play wraps instead of stopping
//! playlist.toggle_continuous_play();
//! playlist.play_next().unwrap();
//! assert!(matches!(playlist.play_next(), Ok(PlaybackReport::NowPlaying { .. })));
//! ```
//!
//! # Example: Whole-playlist play-through
//!
//! ```rust
//! use tempo_playlist::{InstantTimer, Playlist, PlaylistConfig};
//!
//! let config = PlaylistConfig { continuous_play: true, batch_repetitions: 3 };
//! let mut playlist = Playlist::with_timer(config, Box::new(InstantTimer));
//! playlist.add_song("A", "X", 10);
//! playlist.add_song("B", "Y", 20);
//!
//! // Decline after the first batch of three rotations
//! let summary = playlist.play_through(|_batch| false);
//! assert_eq!(summary.songs_played, 6);
//! assert!(!playlist.is_continuous_play());
//! ```

mod error;
mod events;
mod playlist;
mod ring;
mod run;
mod timer;
pub mod types;

// Public exports
pub use error::{PlaylistError, Result};
pub use events::PlaybackEvent;
pub use playlist::Playlist;
pub use ring::{NodeId, Ring};
pub use run::PlaylistRun;
pub use timer::{CancelHandle, InstantTimer, PlaybackTimer, SleepTimer};
pub use types::{
    CursorState, PlaybackReport, PlaylistConfig, PlaythroughSummary, RemovalOutcome, Song,
    WaitOutcome,
};

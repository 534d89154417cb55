//! Error types for playlist editing and playback

use thiserror::Error;

/// Playlist errors
///
/// Every variant is recoverable. An operation that returns one of these has
/// left the ring exactly as it was before the call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaylistError {
    /// Position is outside the range the operation accepts
    #[error("Position out of bounds: {position} (playlist has {len} songs)")]
    PositionOutOfBounds { position: usize, len: usize },

    /// Operation needs at least one song
    #[error("The playlist is empty")]
    EmptyPlaylist,
}

/// Result type for playlist operations
pub type Result<T> = std::result::Result<T, PlaylistError>;

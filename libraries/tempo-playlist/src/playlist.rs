//! Playlist engine - core orchestration
//!
//! Coordinates the ring, the playback cursor, continuous play and the
//! simulated playback wait.

use crate::{
    error::{PlaylistError, Result},
    events::PlaybackEvent,
    ring::{NodeId, Ring},
    run::PlaylistRun,
    timer::{PlaybackTimer, SleepTimer},
    types::{
        CursorState, PlaybackReport, PlaylistConfig, PlaythroughSummary, RemovalOutcome, Song,
        WaitOutcome,
    },
};
use rand::Rng;
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Circular playlist with a playback cursor
///
/// Owns:
/// - The ring of songs (positional insert/remove, shuffle)
/// - The cursor (`Idle` or playing one node of the ring)
/// - The continuous-play flag
/// - The timer that simulates playback
///
/// The cursor always refers to a node that is in the ring. Removing the
/// playing song sends the cursor back to `Idle`.
pub struct Playlist {
    ring: Ring,
    current: Option<NodeId>,

    // Settings
    continuous_play: bool,
    batch_repetitions: u32,

    timer: Box<dyn PlaybackTimer>,

    // Event queue for the caller
    pending_events: Vec<PlaybackEvent>,
}

impl Playlist {
    /// Create an empty playlist that waits in real time while playing
    pub fn new(config: PlaylistConfig) -> Self {
        Self::with_timer(config, Box::new(SleepTimer::new()))
    }

    /// Create an empty playlist with a custom playback timer
    pub fn with_timer(config: PlaylistConfig, timer: Box<dyn PlaybackTimer>) -> Self {
        Self {
            ring: Ring::new(),
            current: None,
            continuous_play: config.continuous_play,
            batch_repetitions: config.batch_repetitions,
            timer,
            pending_events: Vec::new(),
        }
    }

    // ===== Editing =====

    /// Append a song at the end of the playlist
    pub fn add_song(&mut self, title: &str, artist: &str, duration_secs: u64) -> NodeId {
        let id = self.ring.push_back(Song::new(title, artist, duration_secs));
        info!(title, artist, duration_secs, "Song added");
        id
    }

    /// Insert a song at a 1-based position (`len + 1` appends)
    pub fn add_song_at_position(
        &mut self,
        title: &str,
        artist: &str,
        duration_secs: u64,
        position: usize,
    ) -> Result<NodeId> {
        let id = self
            .ring
            .insert_at(position, Song::new(title, artist, duration_secs))
            .map_err(|e| {
                warn!(title, position, "Insert rejected: {}", e);
                e
            })?;
        info!(title, artist, duration_secs, position, "Song added");
        Ok(id)
    }

    /// Remove the song at a 1-based position
    pub fn remove_song_by_position(&mut self, position: usize) -> Result<Song> {
        let (id, song) = self
            .ring
            .remove_at(position)
            .map_err(|e| {
                warn!(position, "Remove rejected: {}", e);
                e
            })?;
        self.release_cursor_if(id, &song);
        info!(title = %song.title, position, "Song removed");
        Ok(song)
    }

    /// Remove every song whose title matches, ignoring case
    ///
    /// Visits each song present at call time exactly once, starting at head.
    /// The visit budget is fixed before anything is removed.
    pub fn remove_song_by_title(&mut self, title: &str) -> RemovalOutcome {
        let budget = self.ring.len();
        let mut node = self.ring.head();
        let mut removed = 0;

        for _ in 0..budget {
            let Some(id) = node else { break };
            let successor = self.ring.next_id(id);

            let matches = self
                .ring
                .get(id)
                .is_some_and(|song| song.title_matches(title));
            if matches {
                if let Some(song) = self.ring.remove(id) {
                    self.release_cursor_if(id, &song);
                    removed += 1;
                }
            }

            node = successor;
        }

        if removed == 0 {
            debug!(title, "No song with this title");
            RemovalOutcome::NotFound
        } else {
            info!(title, removed, "Songs removed by title");
            RemovalOutcome::Removed(removed)
        }
    }

    /// Randomly reorder the playlist
    ///
    /// The playing song keeps playing; only its position changes.
    pub fn shuffle(&mut self) {
        self.shuffle_with(&mut rand::thread_rng());
    }

    /// Randomly reorder the playlist using the given RNG
    pub fn shuffle_with<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        if self.ring.len() < 2 {
            debug!(len = self.ring.len(), "Nothing to shuffle");
            return;
        }
        self.ring.shuffle_with(rng);
        self.pending_events.push(PlaybackEvent::Shuffled {
            len: self.ring.len(),
        });
        info!(len = self.ring.len(), "Playlist shuffled");
    }

    // ===== Playback Control =====

    /// Flip continuous play and return the new state
    pub fn toggle_continuous_play(&mut self) -> bool {
        self.set_continuous_play(!self.continuous_play);
        self.continuous_play
    }

    /// Turn continuous play on or off
    pub fn set_continuous_play(&mut self, enabled: bool) {
        if self.continuous_play == enabled {
            return;
        }
        self.continuous_play = enabled;
        self.pending_events
            .push(PlaybackEvent::ContinuousPlayChanged { enabled });
        info!(enabled, "Continuous play changed");
    }

    /// Play the song after the cursor
    ///
    /// From `Idle` this is the head. From the tail it wraps to the head with
    /// continuous play on, otherwise the cursor goes `Idle` and the report is
    /// [`PlaybackReport::EndOfPlaylist`].
    pub fn play_next(&mut self) -> Result<PlaybackReport> {
        self.play_next_with(|_| {})
    }

    /// [`Playlist::play_next`] that reports the entered song before waiting
    pub fn play_next_with<E>(&mut self, mut on_event: E) -> Result<PlaybackReport>
    where
        E: FnMut(&PlaybackEvent),
    {
        let head = self.ring.head().ok_or_else(|| {
            warn!("play_next on empty playlist");
            PlaylistError::EmptyPlaylist
        })?;

        let target = match self.current {
            None => Some(head),
            Some(id) if Some(id) == self.ring.tail() => self.continuous_play.then_some(head),
            Some(id) => self.ring.next_id(id),
        };

        Ok(self.enter(target, PlaybackReport::EndOfPlaylist, &mut on_event))
    }

    /// Play the song before the cursor
    ///
    /// From `Idle` this is the tail. From the head it wraps to the tail with
    /// continuous play on, otherwise the cursor goes `Idle` and the report is
    /// [`PlaybackReport::StartOfPlaylist`].
    pub fn play_previous(&mut self) -> Result<PlaybackReport> {
        self.play_previous_with(|_| {})
    }

    /// [`Playlist::play_previous`] that reports the entered song before waiting
    pub fn play_previous_with<E>(&mut self, mut on_event: E) -> Result<PlaybackReport>
    where
        E: FnMut(&PlaybackEvent),
    {
        let (Some(head), Some(tail)) = (self.ring.head(), self.ring.tail()) else {
            warn!("play_previous on empty playlist");
            return Err(PlaylistError::EmptyPlaylist);
        };

        let target = match self.current {
            None => Some(tail),
            Some(id) if id == head => self.continuous_play.then_some(tail),
            Some(id) => self.ring.prev_id(id),
        };

        Ok(self.enter(target, PlaybackReport::StartOfPlaylist, &mut on_event))
    }

    /// Lazy one-pass (or batched, with continuous play) sequence of events
    ///
    /// Every call starts a fresh run at head. See [`PlaylistRun`].
    pub fn play_playlist(&self) -> PlaylistRun<'_> {
        PlaylistRun::new(&self.ring, self.continuous_play, self.batch_repetitions)
    }

    /// Play the whole playlist, waiting out every song
    ///
    /// With continuous play on, `confirm` is called after each batch with
    /// the number of batches finished so far. Returning `false` ends the
    /// play-through and turns continuous play off. A cancelled wait ends the
    /// play-through without touching the flag.
    ///
    /// The cursor used by `play_next` / `play_previous` is not moved.
    pub fn play_through<F>(&mut self, confirm: F) -> PlaythroughSummary
    where
        F: FnMut(u32) -> bool,
    {
        self.play_through_with(|_| {}, confirm)
    }

    /// [`Playlist::play_through`] that also reports every run event
    ///
    /// `on_event` sees each event before its wait starts, so a front end can
    /// print "now playing" lines as they happen.
    pub fn play_through_with<E, F>(&mut self, mut on_event: E, mut confirm: F) -> PlaythroughSummary
    where
        E: FnMut(&PlaybackEvent),
        F: FnMut(u32) -> bool,
    {
        let mut summary = PlaythroughSummary::default();
        let mut declined = false;

        {
            let timer = &self.timer;
            let mut run = PlaylistRun::new(&self.ring, self.continuous_play, self.batch_repetitions);

            'run: loop {
                for event in run.by_ref() {
                    on_event(&event);
                    match event {
                        PlaybackEvent::SongStarted { position, song } => {
                            summary.songs_played += 1;
                            info!(position, title = %song.title, artist = %song.artist, "Playing");
                            if timer.wait(song.duration) == WaitOutcome::Cancelled {
                                info!("Play-through cancelled");
                                summary.cancelled = true;
                                break 'run;
                            }
                        }
                        PlaybackEvent::RotationCompleted { .. } => summary.rotations += 1,
                        PlaybackEvent::BatchCompleted { .. } => summary.batches += 1,
                        _ => {}
                    }
                }

                if !run.awaiting_decision() {
                    break;
                }
                if !confirm(summary.batches) {
                    declined = true;
                    break;
                }
                run.next_batch();
            }
        }

        if declined {
            self.set_continuous_play(false);
        }

        summary
    }

    // ===== State Queries =====

    /// Songs in order, one rotation from head
    ///
    /// An empty vector means the playlist is empty.
    pub fn display_playlist(&self) -> Vec<&Song> {
        self.ring.iter().collect()
    }

    /// Sum of all song durations
    pub fn total_duration(&self) -> Duration {
        self.ring.total_duration()
    }

    /// Number of songs
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    /// Check if the playlist is empty
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Song at a 1-based position
    pub fn song_at(&self, position: usize) -> Option<&Song> {
        self.ring.song_at(position)
    }

    /// Currently playing song
    pub fn current_song(&self) -> Option<&Song> {
        self.current.and_then(|id| self.ring.get(id))
    }

    /// Handle of the currently playing node
    pub fn current_id(&self) -> Option<NodeId> {
        self.current
    }

    /// 1-based position of the playing song
    pub fn current_position(&self) -> Option<usize> {
        self.current.and_then(|id| self.ring.position_of(id))
    }

    /// Cursor state with the playing song's position
    pub fn cursor_state(&self) -> CursorState {
        self.current_position()
            .map_or(CursorState::Idle, |position| CursorState::Playing { position })
    }

    /// Whether continuous play is on
    pub fn is_continuous_play(&self) -> bool {
        self.continuous_play
    }

    /// Rotations per continuous batch
    pub fn batch_repetitions(&self) -> u32 {
        self.batch_repetitions
    }

    /// Read-only view of the ring
    pub fn ring(&self) -> &Ring {
        &self.ring
    }

    // ===== Events =====

    /// Drain all pending events
    pub fn drain_events(&mut self) -> Vec<PlaybackEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Check if there are pending events
    pub fn has_pending_events(&self) -> bool {
        !self.pending_events.is_empty()
    }

    // ===== Internals =====

    /// Move the cursor and play what it lands on
    ///
    /// The cursor is committed before the wait starts, so a cancelled wait
    /// leaves it on the entered song.
    fn enter(
        &mut self,
        target: Option<NodeId>,
        boundary: PlaybackReport,
        on_event: &mut dyn FnMut(&PlaybackEvent),
    ) -> PlaybackReport {
        let landed = target.and_then(|id| {
            let position = self.ring.position_of(id)?;
            let song = self.ring.get(id)?.clone();
            Some((id, position, song))
        });

        let Some((id, position, song)) = landed else {
            self.current = None;
            let event = if boundary == PlaybackReport::StartOfPlaylist {
                PlaybackEvent::StartOfPlaylist
            } else {
                PlaybackEvent::EndOfPlaylist
            };
            on_event(&event);
            self.pending_events.push(event);
            debug!(?boundary, "Reached playlist boundary");
            return boundary;
        };

        self.current = Some(id);
        let event = PlaybackEvent::SongStarted {
            position,
            song: song.clone(),
        };
        on_event(&event);
        self.pending_events.push(event);
        info!(position, title = %song.title, artist = %song.artist, "Playing");

        let wait = self.timer.wait(song.duration);
        PlaybackReport::NowPlaying {
            position,
            song,
            wait,
        }
    }

    fn release_cursor_if(&mut self, removed: NodeId, song: &Song) {
        if self.current == Some(removed) {
            self.current = None;
            self.pending_events.push(PlaybackEvent::CursorReleased { song: song.clone() });
            debug!(title = %song.title, "Playing song removed, cursor idle");
        }
    }
}

impl Default for Playlist {
    fn default() -> Self {
        Self::new(PlaylistConfig::default())
    }
}

impl fmt::Debug for Playlist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Playlist")
            .field("ring", &self.ring)
            .field("current", &self.current)
            .field("continuous_play", &self.continuous_play)
            .field("batch_repetitions", &self.batch_repetitions)
            .finish_non_exhaustive()
    }
}

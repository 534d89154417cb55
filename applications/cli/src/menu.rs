//! Interactive playlist menu
//!
//! A numbered menu over any `BufRead` / `Write` pair, so the same loop runs
//! on stdin/stdout and on scripted input in tests.

use crate::error::Result;
use serde::Serialize;
use std::cell::RefCell;
use std::io::{self, BufRead, Write};
use std::str::FromStr;
use tempo_playlist::{PlaybackEvent, PlaybackReport, Playlist, PlaylistError, RemovalOutcome};
use tracing::{debug, info};

const DURATION_PROMPT: &str = "Please be noted that the program will wait for the number of duration of the song when playing the song. Enter duration (in seconds): ";
const INVALID_NUMBER: &str = "Invalid input. Please enter a valid number.";
const INVALID_CHOICE: &str = "Invalid choice. Please try again.";

/// What the loop does after handling one choice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

/// One answer to a numeric prompt
enum Answer<T> {
    Value(T),
    Invalid,
    Closed,
}

/// Row of the JSON playlist listing
#[derive(Debug, Serialize)]
struct SongRow<'a> {
    position: usize,
    title: &'a str,
    artist: &'a str,
    duration_secs: u64,
}

/// Console menu driving one playlist
pub struct Menu<R, W> {
    playlist: Playlist,
    input: R,
    output: W,
    json: bool,
}

impl<R: BufRead, W: Write> Menu<R, W> {
    pub fn new(playlist: Playlist, input: R, output: W) -> Self {
        Self {
            playlist,
            input,
            output,
            json: false,
        }
    }

    /// Render the playlist listing (option 3) as JSON
    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    /// Consume the menu and hand back the writer
    pub fn into_output(self) -> W {
        self.output
    }

    /// Run until the user picks "Exit" or input ends
    pub fn run(&mut self) -> Result<()> {
        writeln!(self.output, "Welcome to your playlist!!!")?;

        loop {
            self.print_menu()?;
            let Some(line) = self.read_line()? else {
                debug!("Input closed, leaving menu");
                break;
            };

            let flow = match line.parse::<u32>() {
                Ok(choice) => self.dispatch(choice)?,
                Err(_) => {
                    writeln!(self.output, "{}", INVALID_NUMBER)?;
                    Flow::Continue
                }
            };
            self.log_events();

            if flow == Flow::Exit {
                break;
            }
        }

        self.output.flush()?;
        Ok(())
    }

    /// Consume the engine's queued events so they never pile up
    fn log_events(&mut self) {
        for event in self.playlist.drain_events() {
            debug!(?event, "Playlist event");
        }
    }

    fn print_menu(&mut self) -> io::Result<()> {
        writeln!(self.output, "What do you want to do?")?;
        writeln!(self.output, "1. Add a song")?;
        writeln!(self.output, "2. Add a song at a specific position")?;
        writeln!(self.output, "3. Display playlist")?;
        writeln!(self.output, "4. Display total duration")?;
        writeln!(self.output, "5. Remove a song by title")?;
        writeln!(self.output, "6. Remove a song by position")?;
        writeln!(self.output, "7. Shuffle playlist")?;
        writeln!(self.output, "8. Toggle continuous play")?;
        writeln!(self.output, "9. Play next song")?;
        writeln!(self.output, "10. Play previous song")?;
        writeln!(self.output, "11. Play your playlist")?;
        writeln!(self.output, "12. Exit")?;
        write!(self.output, "Option:")?;
        self.output.flush()
    }

    fn dispatch(&mut self, choice: u32) -> Result<Flow> {
        debug!(choice, "Menu choice");
        match choice {
            1 => self.add_song(),
            2 => self.add_song_at_position(),
            3 => self.display_playlist(),
            4 => self.display_total_duration(),
            5 => self.remove_by_title(),
            6 => self.remove_by_position(),
            7 => self.shuffle(),
            8 => self.toggle_continuous_play(),
            9 => self.play_next(),
            10 => self.play_previous(),
            11 => self.play_playlist(),
            12 => {
                writeln!(self.output, "So sad to see you go. Hope to see you again.")?;
                Ok(Flow::Exit)
            }
            _ => {
                writeln!(self.output, "{}", INVALID_CHOICE)?;
                Ok(Flow::Continue)
            }
        }
    }

    // ===== Editing =====

    fn add_song(&mut self) -> Result<Flow> {
        let Some(title) = self.ask_text("Enter song title: ")? else {
            return Ok(Flow::Exit);
        };
        let Some(artist) = self.ask_text("Enter artist: ")? else {
            return Ok(Flow::Exit);
        };
        let duration = match self.ask_number::<u64>(DURATION_PROMPT)? {
            Answer::Value(duration) => duration,
            Answer::Invalid => return self.invalid_number(),
            Answer::Closed => return Ok(Flow::Exit),
        };

        self.playlist.add_song(&title, &artist, duration);
        writeln!(self.output, "Song has been added successfully.")?;
        Ok(Flow::Continue)
    }

    fn add_song_at_position(&mut self) -> Result<Flow> {
        let Some(title) = self.ask_text("Enter song title: ")? else {
            return Ok(Flow::Exit);
        };
        let Some(artist) = self.ask_text("Enter artist: ")? else {
            return Ok(Flow::Exit);
        };
        let duration = match self.ask_number::<u64>(DURATION_PROMPT)? {
            Answer::Value(duration) => duration,
            Answer::Invalid => return self.invalid_number(),
            Answer::Closed => return Ok(Flow::Exit),
        };
        let position = match self.ask_number::<usize>("Enter position: ")? {
            Answer::Value(position) => position,
            Answer::Invalid => return self.invalid_number(),
            Answer::Closed => return Ok(Flow::Exit),
        };

        match self
            .playlist
            .add_song_at_position(&title, &artist, duration, position)
        {
            Ok(_) => writeln!(self.output, "Song has been added successfully.")?,
            Err(e) => self.report_error(&e)?,
        }
        Ok(Flow::Continue)
    }

    fn remove_by_title(&mut self) -> Result<Flow> {
        let Some(title) = self.ask_text("Enter the title of the song to remove: ")? else {
            return Ok(Flow::Exit);
        };

        if self.playlist.is_empty() {
            writeln!(
                self.output,
                "The playlist is empty. There is nothing to remove"
            )?;
            return Ok(Flow::Continue);
        }

        match self.playlist.remove_song_by_title(&title) {
            RemovalOutcome::Removed(count) => {
                info!(title = %title, count, "Removed by title");
                writeln!(
                    self.output,
                    "All songs with the title {} have been removed.",
                    title
                )?;
            }
            RemovalOutcome::NotFound => {
                writeln!(self.output, "There is no song with the title {}", title)?;
            }
        }
        Ok(Flow::Continue)
    }

    fn remove_by_position(&mut self) -> Result<Flow> {
        let position = match self.ask_number::<usize>("Enter the position of the song to remove: ")? {
            Answer::Value(position) => position,
            Answer::Invalid => return self.invalid_number(),
            Answer::Closed => return Ok(Flow::Exit),
        };

        match self.playlist.remove_song_by_position(position) {
            Ok(_) => writeln!(self.output, "Song has been removed successfully.")?,
            Err(e) => self.report_error(&e)?,
        }
        Ok(Flow::Continue)
    }

    fn shuffle(&mut self) -> Result<Flow> {
        if self.playlist.is_empty() {
            writeln!(self.output, "The list is empty")?;
            return Ok(Flow::Continue);
        }

        writeln!(self.output, "Shuffling playlist...")?;
        if self.playlist.len() < 2 {
            return Ok(Flow::Continue);
        }

        self.playlist.shuffle();
        writeln!(self.output, "The playlist has been shuffled successfully.")?;
        Ok(Flow::Continue)
    }

    // ===== Listing =====

    fn display_playlist(&mut self) -> Result<Flow> {
        let songs = self.playlist.display_playlist();

        if self.json {
            let rows: Vec<SongRow<'_>> = songs
                .iter()
                .enumerate()
                .map(|(index, song)| SongRow {
                    position: index + 1,
                    title: &song.title,
                    artist: &song.artist,
                    duration_secs: song.duration.as_secs(),
                })
                .collect();
            serde_json::to_writer_pretty(&mut self.output, &rows)?;
            writeln!(self.output)?;
            return Ok(Flow::Continue);
        }

        if songs.is_empty() {
            writeln!(self.output, "The playlist is empty")?;
            return Ok(Flow::Continue);
        }

        writeln!(self.output, "Playlist:")?;
        for song in songs {
            writeln!(self.output, "{}", song)?;
        }
        Ok(Flow::Continue)
    }

    fn display_total_duration(&mut self) -> Result<Flow> {
        writeln!(
            self.output,
            "Total Duration: {} seconds",
            self.playlist.total_duration().as_secs()
        )?;
        Ok(Flow::Continue)
    }

    // ===== Playback =====

    fn toggle_continuous_play(&mut self) -> Result<Flow> {
        writeln!(self.output, "Toggling continuous play...")?;
        if self.playlist.toggle_continuous_play() {
            writeln!(self.output, "Continuous play mode enabled.")?;
        } else {
            writeln!(self.output, "Continuous play mode disabled.")?;
        }
        Ok(Flow::Continue)
    }

    fn play_next(&mut self) -> Result<Flow> {
        if self.playlist.is_empty() {
            writeln!(self.output, "The playlist is empty")?;
            return Ok(Flow::Continue);
        }

        writeln!(self.output, "Playing next song:")?;
        let output = &mut self.output;
        let mut write_error = None;
        let report = self.playlist.play_next_with(|event| {
            if let Err(e) = announce(output, event) {
                write_error = write_error.take().or(Some(e));
            }
        })?;
        if let Some(e) = write_error {
            return Err(e.into());
        }

        if report == PlaybackReport::EndOfPlaylist {
            writeln!(self.output, "That's the end.")?;
        }
        Ok(Flow::Continue)
    }

    fn play_previous(&mut self) -> Result<Flow> {
        if self.playlist.is_empty() {
            writeln!(self.output, "The list is empty")?;
            return Ok(Flow::Continue);
        }

        writeln!(self.output, "Playing previous song:")?;
        let output = &mut self.output;
        let mut write_error = None;
        let report = self.playlist.play_previous_with(|event| {
            if let Err(e) = announce(output, event) {
                write_error = write_error.take().or(Some(e));
            }
        })?;
        if let Some(e) = write_error {
            return Err(e.into());
        }

        if report == PlaybackReport::StartOfPlaylist {
            writeln!(self.output, "That is all")?;
        }
        Ok(Flow::Continue)
    }

    fn play_playlist(&mut self) -> Result<Flow> {
        if self.playlist.is_empty() {
            writeln!(self.output, "The list is empty")?;
            return Ok(Flow::Continue);
        }

        let repetitions = self.playlist.batch_repetitions();

        // Both callbacks write to the console; the wait happens in between
        let console = RefCell::new(Console {
            input: &mut self.input,
            output: &mut self.output,
            error: None,
        });

        let summary = self.playlist.play_through_with(
            |event| {
                if let PlaybackEvent::SongStarted { song, .. } = event {
                    console
                        .borrow_mut()
                        .say(format_args!("Playing: {} by {}", song.title, song.artist));
                }
            },
            |_batch| console.borrow_mut().confirm(repetitions),
        );

        if let Some(e) = console.into_inner().error {
            return Err(e.into());
        }

        info!(
            songs = summary.songs_played,
            rotations = summary.rotations,
            batches = summary.batches,
            cancelled = summary.cancelled,
            "Play-through finished"
        );
        Ok(Flow::Continue)
    }

    // ===== Input =====

    /// Next input line without its line ending; `None` at end of input
    fn read_line(&mut self) -> io::Result<Option<String>> {
        read_trimmed_line(&mut self.input)
    }

    fn ask_text(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;
        self.read_line()
    }

    fn ask_number<T: FromStr>(&mut self, prompt: &str) -> io::Result<Answer<T>> {
        Ok(match self.ask_text(prompt)? {
            None => Answer::Closed,
            Some(line) => match line.trim().parse() {
                Ok(value) => Answer::Value(value),
                Err(_) => Answer::Invalid,
            },
        })
    }

    fn invalid_number(&mut self) -> Result<Flow> {
        writeln!(self.output, "{}", INVALID_NUMBER)?;
        Ok(Flow::Continue)
    }

    fn report_error(&mut self, error: &PlaylistError) -> io::Result<()> {
        let message = match error {
            PlaylistError::PositionOutOfBounds { .. } => "Position out of bounds",
            PlaylistError::EmptyPlaylist => "The playlist is empty",
        };
        writeln!(self.output, "{}", message)
    }
}

/// Input and output borrowed for the length of a play-through
struct Console<'a, R, W> {
    input: &'a mut R,
    output: &'a mut W,
    error: Option<io::Error>,
}

impl<R: BufRead, W: Write> Console<'_, R, W> {
    fn say(&mut self, line: std::fmt::Arguments<'_>) {
        let result = writeln!(self.output, "{}", line).and_then(|()| self.output.flush());
        self.keep_error(result);
    }

    /// Ask whether to play another batch; only "yes" (any case) goes on
    fn confirm(&mut self, repetitions: u32) -> bool {
        let prompt = write!(
            self.output,
            "Do you want to continue playing the playlist for another {} times? (yes/no):",
            repetitions
        )
        .and_then(|()| self.output.flush());
        self.keep_error(prompt);

        match read_trimmed_line(&mut *self.input) {
            Ok(Some(answer)) => answer.trim().eq_ignore_ascii_case("yes"),
            Ok(None) => false,
            Err(e) => {
                self.keep_error(Err(e));
                false
            }
        }
    }

    fn keep_error(&mut self, result: io::Result<()>) {
        if let Err(e) = result {
            self.error = self.error.take().or(Some(e));
        }
    }
}

fn announce<W: Write>(output: &mut W, event: &PlaybackEvent) -> io::Result<()> {
    if let PlaybackEvent::SongStarted { song, .. } = event {
        writeln!(output, "Playing: {}", song)?;
        output.flush()?;
    }
    Ok(())
}

fn read_trimmed_line<R: BufRead + ?Sized>(input: &mut R) -> io::Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempo_playlist::{InstantTimer, PlaylistConfig};

    fn run_script(script: &str) -> String {
        let playlist = Playlist::with_timer(PlaylistConfig::default(), Box::new(InstantTimer));
        let mut menu = Menu::new(playlist, Cursor::new(script.to_string()), Vec::new());
        menu.run().unwrap();
        String::from_utf8(menu.into_output()).unwrap()
    }

    #[test]
    fn eof_ends_the_loop() {
        let output = run_script("");
        assert!(output.starts_with("Welcome to your playlist!!!"));
        assert!(output.ends_with("Option:"));
    }

    #[test]
    fn non_numeric_choice_is_rejected() {
        let output = run_script("abc\n12\n");
        assert!(output.contains(INVALID_NUMBER));
        assert!(output.contains("So sad to see you go."));
    }

    #[test]
    fn unknown_choice_is_rejected() {
        let output = run_script("42\n0\n12\n");
        assert_eq!(output.matches(INVALID_CHOICE).count(), 2);
    }

    #[test]
    fn invalid_duration_abandons_the_add() {
        let output = run_script("1\nSong\nArtist\nlong\n3\n12\n");
        assert!(output.contains(INVALID_NUMBER));
        assert!(output.contains("The playlist is empty"));
        assert!(!output.contains("Song has been added successfully."));
    }

    #[test]
    fn negative_position_is_invalid_input() {
        let output = run_script("6\n-1\n12\n");
        assert!(output.contains(INVALID_NUMBER));
    }

    #[test]
    fn read_trimmed_line_strips_line_endings() {
        let mut input = Cursor::new("  Hello \r\nnext");
        assert_eq!(
            read_trimmed_line(&mut input).unwrap(),
            Some("Hello".to_string())
        );
        assert_eq!(
            read_trimmed_line(&mut input).unwrap(),
            Some("next".to_string())
        );
        assert_eq!(read_trimmed_line(&mut input).unwrap(), None);
    }
}

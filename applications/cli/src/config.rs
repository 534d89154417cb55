/// CLI configuration
use crate::error::{CliError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tempo_playlist::PlaylistConfig;

/// Config file looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "tempo.toml";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CliConfig {
    #[serde(default = "default_playback")]
    pub playback: PlaybackSettings,

    #[serde(default = "default_display")]
    pub display: DisplaySettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PlaybackSettings {
    #[serde(default)]
    pub continuous_play: bool,

    /// Rotations per continuous batch before asking to go on
    #[serde(default = "default_batch_repetitions")]
    pub batch_repetitions: u32,

    /// Multiplier on every simulated wait (0 plays instantly)
    #[serde(default = "default_time_scale")]
    pub time_scale: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DisplaySettings {
    /// Print the playlist listing as JSON
    #[serde(default)]
    pub json: bool,
}

/// Command-line overrides, applied after file and environment
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub time_scale: Option<f64>,
    pub continuous: bool,
    pub json: bool,
}

impl CliConfig {
    /// Load configuration from file and process environment
    ///
    /// An explicit `path` must exist; the default `tempo.toml` is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_from(path, None)
    }

    /// Load configuration with an explicit environment map
    ///
    /// `None` reads the process environment.
    pub fn load_from(path: Option<&Path>, env: Option<HashMap<String, String>>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path.to_path_buf()).required(true));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        // Override with environment variables (TEMPO_PLAYBACK__TIME_SCALE=0)
        settings = settings.add_source(
            config::Environment::with_prefix("TEMPO")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(env.map(|vars| vars.into_iter().collect())),
        );

        let config = settings
            .build()
            .map_err(|e| CliError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| CliError::Config(e.to_string()))
    }

    /// Apply command-line flags on top of the loaded values
    pub fn apply(&mut self, overrides: &Overrides) {
        if let Some(time_scale) = overrides.time_scale {
            self.playback.time_scale = time_scale;
        }
        if overrides.continuous {
            self.playback.continuous_play = true;
        }
        if overrides.json {
            self.display.json = true;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let time_scale = self.playback.time_scale;
        if !time_scale.is_finite() || time_scale < 0.0 {
            return Err(CliError::Config(format!(
                "time_scale must be a finite number >= 0 (got {})",
                time_scale
            )));
        }

        if self.playback.batch_repetitions == 0 {
            return Err(CliError::Config(
                "batch_repetitions must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Settings handed to the playlist engine
    pub fn playlist_config(&self) -> PlaylistConfig {
        PlaylistConfig {
            continuous_play: self.playback.continuous_play,
            batch_repetitions: self.playback.batch_repetitions,
        }
    }
}

// Default values
fn default_playback() -> PlaybackSettings {
    PlaybackSettings {
        continuous_play: false,
        batch_repetitions: default_batch_repetitions(),
        time_scale: default_time_scale(),
    }
}

fn default_batch_repetitions() -> u32 {
    3
}

fn default_time_scale() -> f64 {
    1.0
}

fn default_display() -> DisplaySettings {
    DisplaySettings { json: false }
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            playback: default_playback(),
            display: default_display(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CliConfig::default();
        assert!(!config.playback.continuous_play);
        assert_eq!(config.playback.batch_repetitions, 3);
        assert_eq!(config.playback.time_scale, 1.0);
        assert!(!config.display.json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_matches_playlist_defaults() {
        assert_eq!(
            CliConfig::default().playlist_config(),
            PlaylistConfig::default()
        );
    }

    #[test]
    fn test_validate_rejects_bad_time_scale() {
        for time_scale in [-1.0, f64::NAN, f64::INFINITY] {
            let mut config = CliConfig::default();
            config.playback.time_scale = time_scale;
            assert!(matches!(config.validate(), Err(CliError::Config(_))));
        }
    }

    #[test]
    fn test_validate_rejects_zero_batch() {
        let mut config = CliConfig::default();
        config.playback.batch_repetitions = 0;
        assert!(matches!(config.validate(), Err(CliError::Config(_))));
    }

    #[test]
    fn test_overrides() {
        let mut config = CliConfig::default();
        config.apply(&Overrides {
            time_scale: Some(0.0),
            continuous: true,
            json: true,
        });
        assert_eq!(config.playback.time_scale, 0.0);
        assert!(config.playback.continuous_play);
        assert!(config.display.json);
    }

    #[test]
    fn test_absent_overrides_keep_loaded_values() {
        let mut config = CliConfig::default();
        config.playback.continuous_play = true;
        config.apply(&Overrides::default());
        assert!(config.playback.continuous_play);
        assert_eq!(config.playback.time_scale, 1.0);
    }
}

//! Configuration loading tests
//!
//! File, environment and flag layering for `CliConfig`.

use std::collections::HashMap;
use std::io::Write;
use tempo_cli::config::Overrides;
use tempo_cli::{CliConfig, CliError};

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("create temp config");
    file.write_all(contents.as_bytes()).expect("write temp config");
    file
}

fn env(vars: &[(&str, &str)]) -> Option<HashMap<String, String>> {
    Some(
        vars.iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect(),
    )
}

#[test]
fn test_load_from_file() {
    let file = write_config(
        r#"
[playback]
continuous_play = true
batch_repetitions = 5
time_scale = 0.5

[display]
json = true
"#,
    );

    let config = CliConfig::load_from(Some(file.path()), env(&[])).unwrap();

    assert!(config.playback.continuous_play);
    assert_eq!(config.playback.batch_repetitions, 5);
    assert_eq!(config.playback.time_scale, 0.5);
    assert!(config.display.json);
    assert!(config.validate().is_ok());
}

#[test]
fn test_partial_file_keeps_defaults() {
    let file = write_config("[playback]\ntime_scale = 0.0\n");

    let config = CliConfig::load_from(Some(file.path()), env(&[])).unwrap();

    assert_eq!(config.playback.time_scale, 0.0);
    assert_eq!(config.playback.batch_repetitions, 3);
    assert!(!config.playback.continuous_play);
    assert!(!config.display.json);
}

#[test]
fn test_environment_overrides_file() {
    let file = write_config("[playback]\nbatch_repetitions = 5\n");

    let config = CliConfig::load_from(
        Some(file.path()),
        env(&[
            ("TEMPO_PLAYBACK__BATCH_REPETITIONS", "2"),
            ("TEMPO_PLAYBACK__CONTINUOUS_PLAY", "true"),
        ]),
    )
    .unwrap();

    assert_eq!(config.playback.batch_repetitions, 2);
    assert!(config.playback.continuous_play);
}

#[test]
fn test_flags_override_environment() {
    let file = write_config("");
    let mut config = CliConfig::load_from(
        Some(file.path()),
        env(&[("TEMPO_PLAYBACK__TIME_SCALE", "2.0")]),
    )
    .unwrap();
    assert_eq!(config.playback.time_scale, 2.0);

    config.apply(&Overrides {
        time_scale: Some(0.0),
        ..Overrides::default()
    });
    assert_eq!(config.playback.time_scale, 0.0);
}

#[test]
fn test_missing_explicit_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.toml");

    let result = CliConfig::load_from(Some(&missing), env(&[]));
    assert!(matches!(result, Err(CliError::Config(_))));
}

#[test]
fn test_malformed_file_is_an_error() {
    let file = write_config("[playback]\nbatch_repetitions = \"many\"\n");
    let result = CliConfig::load_from(Some(file.path()), env(&[]));
    assert!(matches!(result, Err(CliError::Config(_))));
}

#[test]
fn test_validation_rejects_zero_batch_from_file() {
    let file = write_config("[playback]\nbatch_repetitions = 0\n");
    let config = CliConfig::load_from(Some(file.path()), env(&[])).unwrap();
    assert!(matches!(config.validate(), Err(CliError::Config(_))));
}

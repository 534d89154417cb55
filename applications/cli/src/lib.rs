//! Tempo CLI - console front end for the circular playlist engine
//!
//! Reads menu choices, validates input and renders results. All playlist
//! semantics live in `tempo_playlist`.

pub mod config;
pub mod error;
pub mod menu;

pub use config::CliConfig;
pub use error::{CliError, Result};
pub use menu::Menu;

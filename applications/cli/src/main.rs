/// Tempo - interactive circular playlist
use clap::Parser;
use std::io;
use std::path::PathBuf;
use tempo_cli::{config::Overrides, CliConfig, Menu};
use tempo_playlist::{CancelHandle, Playlist, SleepTimer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Exit status for a process ended by SIGINT
const INTERRUPTED_EXIT_CODE: i32 = 130;

#[derive(Parser)]
#[command(name = "tempo")]
#[command(about = "Circular playlist with continuous play", long_about = None)]
struct Cli {
    /// Configuration file path (default: ./tempo.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Multiplier on simulated playback waits (0 plays instantly)
    #[arg(long)]
    time_scale: Option<f64>,

    /// Start with continuous play enabled
    #[arg(long)]
    continuous: bool,

    /// Print the playlist listing as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing; stdout belongs to the menu
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tempo_cli=info,tempo_playlist=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();

    // Load configuration
    let mut config = CliConfig::load(cli.config.as_deref())?;
    config.apply(&Overrides {
        time_scale: cli.time_scale,
        continuous: cli.continuous,
        json: cli.json,
    });
    config.validate()?;

    info!(
        continuous_play = config.playback.continuous_play,
        batch_repetitions = config.playback.batch_repetitions,
        time_scale = config.playback.time_scale,
        "Starting Tempo"
    );

    let timer = SleepTimer::with_time_scale(config.playback.time_scale);
    spawn_interrupt_listener(timer.cancel_handle())?;
    let playlist = Playlist::with_timer(config.playlist_config(), Box::new(timer));

    let stdin = io::stdin();
    let mut menu = Menu::new(playlist, stdin.lock(), io::stdout()).with_json(config.display.json);
    menu.run()?;

    Ok(())
}

/// Route Ctrl-C to the playback timer
///
/// While a song plays, Ctrl-C skips the rest of its wait. At the menu
/// prompt it ends the process.
fn spawn_interrupt_listener(cancel: CancelHandle) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    std::thread::Builder::new()
        .name("tempo-signals".into())
        .spawn(move || {
            runtime.block_on(async move {
                while tokio::signal::ctrl_c().await.is_ok() {
                    if cancel.cancel() {
                        info!("Skipped current song");
                    } else {
                        info!("Interrupted, exiting");
                        std::process::exit(INTERRUPTED_EXIT_CODE);
                    }
                }
            });
        })?;

    Ok(())
}

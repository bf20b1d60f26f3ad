#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use clap::Parser;

use rift_alerts::core::alerts::dispatch::{DirectDelivery, Senders};
use rift_alerts::core::alerts::engine::AlertEngine;
use rift_alerts::core::alerts::location::{DistanceTable, TrackedCharacters};
use rift_alerts::core::clock::ManualClock;
use rift_alerts::core::config::{ConfigManager, Settings};
use rift_alerts::core::error::ReplayError;
use rift_alerts::core::replay::{ReplayStream, Replayer};

/// Replay recorded intel, game log and chat events against a set of alerts
/// and log every notification they would produce.
#[derive(Parser, Debug)]
#[command(name = "rift-alerts", version, about = "RIFT alert engine replay")]
struct Cli {
    /// Settings file holding the alerts (defaults apply when missing)
    #[arg(short, long, default_value = "settings.json")]
    settings: PathBuf,

    /// JSON distance table: {"routes": [{"from", "to", "jumps", "via_jump_bridge"}]}
    #[arg(short, long)]
    distances: Option<PathBuf>,

    /// Seconds of replayed time between periodic evaluations, 0 to disable
    #[arg(long, default_value_t = 1)]
    tick_seconds: u64,

    /// Play sounds through the default audio device instead of logging them
    #[cfg(feature = "audio")]
    #[arg(long)]
    play_sounds: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Recorded event files (JSON lines), merged by timestamp
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(err) = run(&cli) {
        log::error!("{err}");
        std::process::exit(1);
    }
}

fn init_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();
}

fn run(cli: &Cli) -> Result<(), ReplayError> {
    let settings = ConfigManager::with_path(cli.settings.clone())
        .try_load()?
        .unwrap_or_else(|| {
            log::warn!(
                "{} not found, replaying without alerts",
                cli.settings.display()
            );
            Settings::default()
        });

    let distances = match &cli.distances {
        Some(path) => load_distances(path)?,
        None => DistanceTable::new(),
    };

    let stream = ReplayStream::open(cli.files.as_slice())?;
    let clock = Arc::new(ManualClock::new(stream.peek_time().unwrap_or_else(Utc::now)));
    let characters = Arc::new(TrackedCharacters::new());

    let engine = AlertEngine::new(
        Arc::new(distances),
        characters.clone(),
        clock.clone(),
        Arc::new(DirectDelivery::new(senders(cli, &settings))),
    )
    .with_config(settings.engine_config());
    engine.set_intel_channels(&settings.intel_channels);
    engine.set_alerts(settings.alerts);

    let tick_every = chrono::Duration::seconds(i64::try_from(cli.tick_seconds).unwrap_or(i64::MAX));
    let summary = Replayer::new(Arc::new(engine), clock, characters)
        .with_ticks(tick_every)
        .run(stream);

    println!(
        "{} record(s), {} tick(s), {} alert firing(s)",
        summary.records,
        summary.ticks,
        summary.fired.len()
    );
    Ok(())
}

fn load_distances(path: &Path) -> Result<DistanceTable, ReplayError> {
    let content = fs::read_to_string(path).map_err(|source| ReplayError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|e| ReplayError::Distances {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

#[cfg(feature = "audio")]
fn senders(cli: &Cli, settings: &Settings) -> Senders {
    use rift_alerts::core::sounds::RodioPlayer;

    let mut senders = Senders::logging();
    if cli.play_sounds {
        let sound_dir = settings
            .sound_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("sounds"));
        senders.sound = Arc::new(RodioPlayer::new(sound_dir));
    }
    senders
}

#[cfg(not(feature = "audio"))]
fn senders(_cli: &Cli, _settings: &Settings) -> Senders {
    Senders::logging()
}

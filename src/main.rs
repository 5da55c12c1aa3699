use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use flight_state::logger::{FlightLogger, PrintObserver};
use flight_state::{FlightClassifier, FlightConfig, telemetry};

#[derive(Parser, Debug)]
#[command(name = "flight-state")]
#[command(about = "Flight phase detection from barometer and accelerometer data")]
#[command(version)]
struct Args {
    /// TOML vehicle profile overriding the default thresholds
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the flight state machine as a Graphviz digraph
    Dot,
    /// Replay two recorder files through the classifier
    Csv {
        first: PathBuf,
        second: PathBuf,

        /// Also write a CSV flight log into this directory
        #[arg(long)]
        log_dir: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => FlightConfig::load(path)
            .with_context(|| format!("loading vehicle profile {}", path.display()))?,
        None => FlightConfig::default(),
    };

    match args.command {
        Command::Dot => {
            print!("{}", FlightClassifier::new(config).dot());
        }
        Command::Csv {
            first,
            second,
            log_dir,
        } => replay_recordings(config, &first, &second, log_dir)?,
    }
    Ok(())
}

fn replay_recordings(
    config: FlightConfig,
    first: &Path,
    second: &Path,
    log_dir: Option<PathBuf>,
) -> Result<()> {
    let first_rows = telemetry::load(first)?;
    let second_rows = telemetry::load(second)?;
    let rows = telemetry::merge_stages(first_rows, second_rows)?;
    info!("Loaded {} entries", rows.len());

    let logger = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("creating log directory {}", dir.display()))?;
            let logger = FlightLogger::create(&dir)
                .with_context(|| format!("creating flight log in {}", dir.display()))?;
            info!("logging flight to {}", logger.path().display());
            Some(logger)
        }
        None => None,
    };

    let mut classifier = FlightClassifier::with_observer(config, (PrintObserver::new(), logger));
    telemetry::replay(&rows, &mut classifier).context("replaying telemetry")?;

    info!(
        "final state {}, flight time {}",
        classifier.state(),
        classifier
            .flighttime()
            .map_or_else(|| "n/a".to_string(), |us| format!("{:.3}s", us as f64 / 1e6))
    );

    let (_, logger) = classifier.observer_mut();
    if let Some(logger) = logger {
        logger.flush().context("flushing flight log")?;
    }
    Ok(())
}

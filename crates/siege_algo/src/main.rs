//! Siege match driver.
//!
//! Plays one match against the game engine over stdin/stdout.
//!
//! # Usage
//!
//! ```bash
//! # Play with the default strategy file or built-in defaults
//! cargo run -p siege_algo
//!
//! # Play with a specific strategy
//! cargo run -p siege_algo -- run --strategy my_strategy.ron
//!
//! # Validate a strategy file
//! cargo run -p siege_algo -- validate --strategy data/strategy.ron
//! ```
//!
//! # Protocol
//!
//! Input (stdin): engine JSON, one object per line
//! Output (stdout): build and deploy lists, one JSON array per line
//! Logs (stderr): Debug information

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use siege_algo::{load_strategy, resolve_strategy, AlgoRunner};

#[derive(Parser)]
#[command(name = "siege_algo")]
#[command(about = "Breach-and-strike agent for the grid tower-defense engine")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a match over stdin/stdout
    Run {
        /// Strategy file (RON)
        #[arg(short, long)]
        strategy: Option<PathBuf>,
    },

    /// Parse and validate a strategy file
    Validate {
        /// Strategy file (RON)
        #[arg(short, long)]
        strategy: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging to stderr (stdout is for protocol)
    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    match cli.command {
        Some(Commands::Run { strategy }) => cmd_run(strategy),
        Some(Commands::Validate { strategy }) => cmd_validate(strategy),
        None => cmd_run(None),
    }
}

/// Play one match
fn cmd_run(strategy: Option<PathBuf>) -> ExitCode {
    let strategy = match resolve_strategy(strategy.as_deref()) {
        Ok(strategy) => strategy,
        Err(e) => {
            tracing::error!(error = %e, "Cannot load strategy");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!("Waiting for game configuration");
    match AlgoRunner::new(strategy).run_stdio() {
        Ok(summary) => {
            tracing::info!(
                turns = summary.turns_played,
                degraded = summary.degraded_turns,
                bad_frames = summary.bad_frames,
                finished = summary.finished,
                "Session closed"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Match aborted");
            ExitCode::FAILURE
        }
    }
}

/// Validate a strategy file
fn cmd_validate(path: PathBuf) -> ExitCode {
    match load_strategy(&path) {
        Ok(strategy) => {
            println!("{} is valid", path.display());
            println!("  readiness:    {:?}", strategy.readiness);
            println!("  flank policy: {:?}", strategy.flank_policy);
            println!(
                "  layout:       {} priority turrets, {} supports, {} walls, {} turrets",
                strategy.layout.priority_turrets.len(),
                strategy.layout.supports.len(),
                strategy.layout.walls.len(),
                strategy.layout.turrets.len()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{} is invalid: {e}", path.display());
            ExitCode::FAILURE
        }
    }
}

//! Strategy file loading.
//!
//! Strategies are RON files holding a [`StrategyConfig`]. Fields left out
//! of the file keep their built-in defaults.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use siege_core::data::StrategyConfig;
use siege_core::error::SiegeError;

/// Environment variable naming a strategy file to use when none is given.
pub const STRATEGY_ENV: &str = "SIEGE_STRATEGY";

/// Error type for strategy loading.
#[derive(Error, Debug)]
pub enum StrategyError {
    /// File not found.
    #[error("Strategy file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read strategy file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse or validate.
    #[error(transparent)]
    Invalid(#[from] SiegeError),
}

/// Load a strategy from a RON file.
///
/// # Errors
///
/// Returns `StrategyError` if the file is missing, unreadable or invalid.
pub fn load_strategy<P: AsRef<Path>>(path: P) -> Result<StrategyConfig, StrategyError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(StrategyError::FileNotFound(path.display().to_string()));
    }
    let contents = std::fs::read_to_string(path)?;
    let strategy = StrategyConfig::from_ron_str(&path.display().to_string(), &contents)?;
    Ok(strategy)
}

/// Resolve the default strategy file.
///
/// Looks in order at:
/// 1. Environment variable `SIEGE_STRATEGY`
/// 2. `./data/strategy.ron` (running from the crate)
/// 3. `./crates/siege_algo/data/strategy.ron` (repo root)
#[must_use]
pub fn default_strategy_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(STRATEGY_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
    }

    ["data/strategy.ron", "crates/siege_algo/data/strategy.ron"]
        .into_iter()
        .map(PathBuf::from)
        .find(|path| path.exists())
}

/// Load the strategy the runner should play with.
///
/// An explicit path must load. Without one, the default file is used when
/// present, otherwise the built-in defaults.
///
/// # Errors
///
/// Returns `StrategyError` if the chosen file fails to load.
pub fn resolve_strategy(explicit: Option<&Path>) -> Result<StrategyConfig, StrategyError> {
    match explicit.map(Path::to_path_buf).or_else(default_strategy_path) {
        Some(path) => {
            let strategy = load_strategy(&path)?;
            info!(path = %path.display(), "Loaded strategy");
            Ok(strategy)
        }
        None => {
            info!("No strategy file found, using built-in defaults");
            Ok(StrategyConfig::default())
        }
    }
}

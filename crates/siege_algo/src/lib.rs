//! Match driver for the siege decision core.
//!
//! Speaks the game engine's line protocol and hands each turn to
//! [`siege_core::agent::play_turn`]:
//!
//! - **stdin**: game configuration, then state and action frames (JSON)
//! - **stdout**: two lines per turn, the build list and the deploy list
//! - **stderr**: logs (human-readable)
//!
//! See the [`protocol`] module for the frame formats.
//!
//! # Example
//!
//! ```bash
//! # Play a match with the stock strategy
//! cargo run -p siege_algo -- run
//!
//! # Check a strategy file before a match
//! cargo run -p siege_algo -- validate --strategy data/strategy.ron
//! ```

pub mod protocol;
pub mod runner;
pub mod strategy;

pub use protocol::{EngineConfig, StateFrame, TurnAnswer};
pub use runner::{AlgoRunner, MatchSummary, RunError};
pub use strategy::{load_strategy, resolve_strategy, StrategyError};

//! # Siege Core
//!
//! Per-turn decision engine for a grid tower-defense agent.
//!
//! This crate contains **only** deterministic logic:
//! - No IO
//! - No system randomness
//! - No floating-point math (uses fixed-point)
//!
//! Given a snapshot of the battlefield it decides what to build, when to
//! open a breach in our own line, and where to deploy the wave that goes
//! through it.
//!
//! ## Crate Structure
//!
//! - [`board`] - Board query trait and the concrete turn snapshot
//! - [`pathfinding`] - Edge-to-edge walker pathing
//! - [`risk`] - Spawn-location risk model
//! - [`strength`] - Enemy flank strength
//! - [`offense`] - Offensive-readiness state machine
//! - [`defense`] - Defensive layout and upgrades
//! - [`agent`] - Turn orchestration
//! - [`data`] - Game rules and strategy configuration
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod agent;
pub mod board;
pub mod data;
pub mod defense;
pub mod error;
pub mod grid;
pub mod history;
pub mod intents;
pub mod math;
pub mod offense;
pub mod pathfinding;
pub mod risk;
pub mod strength;
pub mod units;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::agent::{play_turn, AgentContext, TurnReport};
    pub use crate::board::{BoardQuery, GameState, PlayerStats};
    pub use crate::data::{GameConfig, StrategyConfig};
    pub use crate::error::{Result, SiegeError};
    pub use crate::grid::{ArenaGeometry, Cell, Edge, Flank};
    pub use crate::history::{BreachHistory, BreachRecord};
    pub use crate::intents::{Intent, TurnPlan};
    pub use crate::math::Fixed;
    pub use crate::offense::{OffensiveState, Transition};
    pub use crate::risk::{RiskModel, WeightProfile, WeightProfiles};
    pub use crate::units::{MobileUnit, Player, ResourcePool, Unit, UnitType};
}

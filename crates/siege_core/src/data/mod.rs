//! Data structures for rules and strategy configuration.
//!
//! This module contains pure data structures: the game rules announced by
//! the engine, the strategy tuning file and the fixed defensive layout. All
//! structs deserialize from RON.
//!
//! **Note:** This module contains no IO - it only defines data types.
//! File loading is handled by `siege_algo`.

mod game_config;
mod layout;
mod strategy;
mod unit_stats;

pub use game_config::{GameConfig, ResourceRules};
pub use layout::{DefenseLayout, EnemyPattern, FlankPlan};
pub use strategy::{FlankPolicy, ReadinessPolicy, StallConfig, StrategyConfig, WaveConfig};
pub use unit_stats::{UnitStats, UnitTable, UpgradeStats};

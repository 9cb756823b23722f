//! Strategy tuning, loaded from `strategy.ron`.

use serde::{Deserialize, Serialize};

use super::layout::{DefenseLayout, FlankPlan};
use crate::error::{Result, SiegeError};
use crate::grid::{Cell, Flank};
use crate::math::{decimal_serde, Fixed};
use crate::risk::{RiskModel, WeightProfiles};

/// When the offense is ready to open a breach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadinessPolicy {
    /// Ready once projected mobility reaches a fixed amount.
    Flat {
        /// Required projected mobility.
        #[serde(with = "decimal_serde")]
        threshold: Fixed,
    },
    /// Fixed amount while the enemy is healthy, otherwise just enough to
    /// finish them off with some margin.
    EnemyHealthMargin {
        /// Below this enemy health the margin rule applies.
        #[serde(with = "decimal_serde")]
        low_health_cutoff: Fixed,
        /// Added to the enemy's health under the margin rule.
        #[serde(with = "decimal_serde")]
        buffer: Fixed,
        /// Threshold while the enemy is at or above the cutoff.
        #[serde(with = "decimal_serde")]
        flat_threshold: Fixed,
    },
}

impl ReadinessPolicy {
    /// Projected mobility required given the enemy's health.
    #[must_use]
    pub fn threshold(&self, enemy_health: Fixed) -> Fixed {
        match *self {
            Self::Flat { threshold } => threshold,
            Self::EnemyHealthMargin {
                low_health_cutoff,
                buffer,
                flat_threshold,
            } => {
                if enemy_health >= low_health_cutoff {
                    flat_threshold
                } else {
                    enemy_health + buffer
                }
            }
        }
    }

    /// Check if `projected` mobility is enough.
    #[must_use]
    pub fn is_ready(&self, projected: Fixed, enemy_health: Fixed) -> bool {
        projected >= self.threshold(enemy_health)
    }
}

impl Default for ReadinessPolicy {
    fn default() -> Self {
        Self::EnemyHealthMargin {
            low_health_cutoff: Fixed::from_num(9),
            buffer: Fixed::from_num(8),
            flat_threshold: Fixed::from_num(14),
        }
    }
}

/// How the flank to breach is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FlankPolicy {
    /// Attack the flank whose enemy triangle is weaker.
    #[default]
    WeakerSide,
    /// Alternate away from where we last scored, unless that was last turn.
    BreachHistory,
}

/// Wave composition parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveConfig {
    /// Interceptors sent ahead when the flank's supports are missing.
    pub interceptor_escort: u32,
    /// Enemy rows that make up the front line.
    pub front_rows: Vec<i32>,
    /// Enemy structures on the front rows that call for demolishers.
    pub front_line_threshold: u32,
    /// More enemy units than this in the flank triangle call for demolishers.
    pub crowded_limit: u32,
    /// Demolishers sent ahead of the scouts when a flank's enemy pattern
    /// shows.
    pub pattern_vanguard: u32,
}

impl Default for WaveConfig {
    fn default() -> Self {
        Self {
            interceptor_escort: 5,
            front_rows: vec![14, 15],
            front_line_threshold: 11,
            crowded_limit: 4,
            pattern_vanguard: 2,
        }
    }
}

/// Early-game interceptors sent when the opponent opens with demolishers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StallConfig {
    /// Last turn the stall applies on.
    pub until_turn: u32,
    /// Deploy cells for the stall interceptors, one each.
    pub cells: Vec<Cell>,
}

impl Default for StallConfig {
    fn default() -> Self {
        Self {
            until_turn: 2,
            cells: vec![Cell::new(10, 3), Cell::new(17, 3)],
        }
    }
}

/// Complete strategy tuning.
///
/// # Example RON
///
/// ```ron
/// StrategyConfig(
///     readiness: Flat(threshold: 14.0),
///     flank_policy: BreachHistory,
///     wave: WaveConfig(interceptor_escort: 4),
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    /// Offense readiness rule.
    pub readiness: ReadinessPolicy,
    /// Flank selection rule.
    pub flank_policy: FlankPolicy,
    /// Left flank breach and triangle.
    pub left: FlankPlan,
    /// Right flank breach and triangle.
    pub right: FlankPlan,
    /// Risk weights per mobile unit.
    pub weights: WeightProfiles,
    /// Radius used to count support coverage along a path.
    #[serde(with = "decimal_serde")]
    pub support_radius: Fixed,
    /// Wave composition.
    pub wave: WaveConfig,
    /// Early stall against demolisher rushes.
    pub stall: StallConfig,
    /// Defensive layout built every turn.
    pub layout: DefenseLayout,
}

impl StrategyConfig {
    /// Parse a strategy from RON text.
    ///
    /// # Errors
    ///
    /// Returns `SiegeError::ConfigParse` naming `origin` if the text is not
    /// a valid strategy or fails [`StrategyConfig::validate`].
    pub fn from_ron_str(origin: &str, text: &str) -> Result<Self> {
        let config: Self = ron::from_str(text).map_err(|e| SiegeError::ConfigParse {
            path: origin.to_string(),
            message: e.to_string(),
        })?;
        config.validate().map_err(|message| SiegeError::ConfigParse {
            path: origin.to_string(),
            message,
        })?;
        Ok(config)
    }

    /// Check the flank plans are labelled consistently and non-empty.
    ///
    /// # Errors
    ///
    /// Returns a description of the first problem found.
    pub fn validate(&self) -> std::result::Result<(), String> {
        for (plan, expected) in [(&self.left, Flank::Left), (&self.right, Flank::Right)] {
            if plan.flank != expected {
                return Err(format!("{expected} flank plan is labelled {}", plan.flank));
            }
            if plan.breach.is_empty() {
                return Err(format!("{expected} flank plan has no breach cells"));
            }
        }
        if self.support_radius < Fixed::ZERO {
            return Err("support_radius must not be negative".to_string());
        }
        Ok(())
    }

    /// Plan for a flank.
    #[must_use]
    pub fn flank(&self, flank: Flank) -> &FlankPlan {
        match flank {
            Flank::Left => &self.left,
            Flank::Right => &self.right,
        }
    }

    /// Risk model built from these weights.
    #[must_use]
    pub fn risk_model(&self) -> RiskModel {
        RiskModel::new(self.weights, self.support_radius)
    }
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            readiness: ReadinessPolicy::default(),
            flank_policy: FlankPolicy::default(),
            left: FlankPlan::standard_left(),
            right: FlankPlan::standard_right(),
            weights: WeightProfiles::default(),
            support_radius: RiskModel::default_support_radius(),
            wave: WaveConfig::default(),
            stall: StallConfig::default(),
            layout: DefenseLayout::standard(),
        }
    }
}

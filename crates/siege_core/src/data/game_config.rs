//! Game rules the engine announces at the start of a match.

use serde::{Deserialize, Serialize};

use super::unit_stats::{UnitStats, UnitTable};
use crate::grid::ArenaGeometry;
use crate::math::{decimal_serde, Fixed};
use crate::units::UnitType;

/// Resource income and decay schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRules {
    /// Fraction of unspent mobility points lost each round.
    #[serde(with = "decimal_serde")]
    pub mobility_decay_per_round: Fixed,

    /// Base mobility points gained each round.
    #[serde(with = "decimal_serde")]
    pub mobility_per_round: Fixed,

    /// Extra mobility per round added every `growth_interval` turns.
    #[serde(with = "decimal_serde")]
    pub mobility_growth_rate: Fixed,

    /// Turns between mobility income increases.
    pub growth_interval: u32,

    /// Structure points gained each round.
    #[serde(with = "decimal_serde")]
    pub structure_per_round: Fixed,
}

impl Default for ResourceRules {
    fn default() -> Self {
        Self {
            mobility_decay_per_round: Fixed::from_num(0.25),
            mobility_per_round: Fixed::from_num(5),
            mobility_growth_rate: Fixed::from_num(1),
            growth_interval: 10,
            structure_per_round: Fixed::from_num(5),
        }
    }
}

/// Complete rule set for a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct GameConfig {
    /// Arena dimensions.
    pub arena: ArenaGeometry,
    /// Per-type unit statistics.
    pub units: UnitTable,
    /// Income schedule.
    pub resources: ResourceRules,
}

impl GameConfig {
    /// Stats for a unit type.
    #[must_use]
    pub fn stats(&self, unit_type: UnitType) -> &UnitStats {
        self.units.get(unit_type)
    }

    /// Wire shorthand for a unit type.
    #[must_use]
    pub fn shorthand(&self, unit_type: UnitType) -> &str {
        &self.units.get(unit_type).shorthand
    }
}

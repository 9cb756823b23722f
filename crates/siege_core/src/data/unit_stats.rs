//! Per-unit-type statistics taken from the game configuration.

use serde::{Deserialize, Serialize};

use crate::math::{decimal_serde, option_decimal_serde, Fixed};
use crate::units::{ResourcePool, UnitType};

/// Stat overrides that apply once a structure is upgraded.
///
/// Fields left as `None` keep the base value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeStats {
    /// Structure points charged for the upgrade.
    #[serde(default, with = "decimal_serde")]
    pub structure_cost: Fixed,

    /// Mobility points charged for the upgrade.
    #[serde(default, with = "decimal_serde")]
    pub mobility_cost: Fixed,

    /// Upgraded damage per hit against mobile units.
    #[serde(default, with = "option_decimal_serde")]
    pub damage_to_mobile: Option<Fixed>,

    /// Upgraded attack range.
    #[serde(default, with = "option_decimal_serde")]
    pub attack_range: Option<Fixed>,

    /// Upgraded maximum health.
    #[serde(default, with = "option_decimal_serde")]
    pub health: Option<Fixed>,
}

/// Game statistics for one unit type.
///
/// # Example RON
///
/// ```ron
/// UnitStats(
///     shorthand: "DF",
///     structure_cost: 2.0,
///     mobility_cost: 0.0,
///     health: 75.0,
///     damage_to_mobile: 6.0,
///     damage_to_structure: 0.0,
///     attack_range: 2.5,
///     upgrade: Some(UpgradeStats(structure_cost: 4.0, damage_to_mobile: Some(14.0))),
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitStats {
    /// Shorthand used on the wire.
    pub shorthand: String,

    /// Structure points to place one unit.
    #[serde(default, with = "decimal_serde")]
    pub structure_cost: Fixed,

    /// Mobility points to deploy one unit.
    #[serde(default, with = "decimal_serde")]
    pub mobility_cost: Fixed,

    /// Starting health.
    #[serde(with = "decimal_serde")]
    pub health: Fixed,

    /// Damage per hit against mobile units.
    #[serde(default, with = "decimal_serde")]
    pub damage_to_mobile: Fixed,

    /// Damage per hit against structures.
    #[serde(default, with = "decimal_serde")]
    pub damage_to_structure: Fixed,

    /// Attack range (Euclidean, in cells).
    #[serde(default, with = "decimal_serde")]
    pub attack_range: Fixed,

    /// Shield granted to each friendly mobile unit passing in range.
    #[serde(default, with = "decimal_serde")]
    pub shield_per_unit: Fixed,

    /// Range of the shield aura.
    #[serde(default, with = "decimal_serde")]
    pub shield_range: Fixed,

    /// Upgrade overrides, if the type can be upgraded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upgrade: Option<UpgradeStats>,
}

impl UnitStats {
    /// Cost of one unit in the given pool.
    #[must_use]
    pub fn cost(&self, pool: ResourcePool) -> Fixed {
        match pool {
            ResourcePool::Structure => self.structure_cost,
            ResourcePool::Mobility => self.mobility_cost,
        }
    }

    /// Cost of upgrading in the given pool; `None` if not upgradable.
    #[must_use]
    pub fn upgrade_cost(&self, pool: ResourcePool) -> Option<Fixed> {
        self.upgrade.as_ref().map(|upgrade| match pool {
            ResourcePool::Structure => upgrade.structure_cost,
            ResourcePool::Mobility => upgrade.mobility_cost,
        })
    }

    /// Damage per hit against mobile units, accounting for upgrades.
    #[must_use]
    pub fn damage_to_mobile(&self, upgraded: bool) -> Fixed {
        self.upgraded_value(upgraded, |u| u.damage_to_mobile)
            .unwrap_or(self.damage_to_mobile)
    }

    /// Attack range, accounting for upgrades.
    #[must_use]
    pub fn attack_range(&self, upgraded: bool) -> Fixed {
        self.upgraded_value(upgraded, |u| u.attack_range)
            .unwrap_or(self.attack_range)
    }

    fn upgraded_value(
        &self,
        upgraded: bool,
        field: impl Fn(&UpgradeStats) -> Option<Fixed>,
    ) -> Option<Fixed> {
        if !upgraded {
            return None;
        }
        self.upgrade.as_ref().and_then(field)
    }

    /// Stock statistics for a unit type, as shipped with the game.
    #[must_use]
    pub fn standard(unit_type: UnitType) -> Self {
        let n = |v: f64| Fixed::from_num(v);
        let base = Self {
            shorthand: unit_type.default_shorthand().to_string(),
            structure_cost: Fixed::ZERO,
            mobility_cost: Fixed::ZERO,
            health: Fixed::ZERO,
            damage_to_mobile: Fixed::ZERO,
            damage_to_structure: Fixed::ZERO,
            attack_range: Fixed::ZERO,
            shield_per_unit: Fixed::ZERO,
            shield_range: Fixed::ZERO,
            upgrade: None,
        };
        match unit_type {
            UnitType::Wall => Self {
                structure_cost: n(1.0),
                health: n(60.0),
                upgrade: Some(UpgradeStats {
                    structure_cost: n(1.5),
                    health: Some(n(120.0)),
                    ..UpgradeStats::default()
                }),
                ..base
            },
            UnitType::Support => Self {
                structure_cost: n(4.0),
                health: n(30.0),
                shield_per_unit: n(3.0),
                shield_range: n(3.5),
                upgrade: Some(UpgradeStats {
                    structure_cost: n(4.0),
                    ..UpgradeStats::default()
                }),
                ..base
            },
            UnitType::Turret => Self {
                structure_cost: n(2.0),
                health: n(75.0),
                damage_to_mobile: n(6.0),
                attack_range: n(2.5),
                upgrade: Some(UpgradeStats {
                    structure_cost: n(4.0),
                    damage_to_mobile: Some(n(14.0)),
                    attack_range: Some(n(3.5)),
                    ..UpgradeStats::default()
                }),
                ..base
            },
            UnitType::Scout => Self {
                mobility_cost: n(1.0),
                health: n(15.0),
                damage_to_mobile: n(2.0),
                damage_to_structure: n(2.0),
                attack_range: n(3.5),
                ..base
            },
            UnitType::Demolisher => Self {
                mobility_cost: n(3.0),
                health: n(5.0),
                damage_to_mobile: n(8.0),
                damage_to_structure: n(8.0),
                attack_range: n(4.5),
                ..base
            },
            UnitType::Interceptor => Self {
                mobility_cost: n(1.0),
                health: n(40.0),
                damage_to_mobile: n(20.0),
                attack_range: n(4.5),
                ..base
            },
        }
    }
}

/// Statistics for all six unit types, indexed by [`UnitType::index`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitTable {
    entries: Vec<UnitStats>,
}

impl UnitTable {
    /// Build a table from entries in engine index order.
    ///
    /// Returns `None` unless exactly one entry per unit type is given.
    #[must_use]
    pub fn from_entries(entries: Vec<UnitStats>) -> Option<Self> {
        (entries.len() == UnitType::ALL.len()).then_some(Self { entries })
    }

    /// Stats for a unit type.
    #[must_use]
    pub fn get(&self, unit_type: UnitType) -> &UnitStats {
        &self.entries[unit_type.index()]
    }

    /// Mutable stats for a unit type.
    pub fn get_mut(&mut self, unit_type: UnitType) -> &mut UnitStats {
        &mut self.entries[unit_type.index()]
    }
}

impl Default for UnitTable {
    fn default() -> Self {
        Self {
            entries: UnitType::ALL.into_iter().map(UnitStats::standard).collect(),
        }
    }
}

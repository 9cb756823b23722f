//! Unit identities, owners and resource pools.
//!
//! Unit kinds are a closed set fixed by the game rules, so they are plain
//! enums rather than data-driven IDs. [`MobileUnit`] narrows [`UnitType`]
//! to the kinds that walk, which lets per-mobile tables be matched
//! exhaustively.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::math::{decimal_serde, Fixed};

/// Every unit kind the game knows, in engine index order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UnitType {
    /// Cheap blocking structure.
    Wall,
    /// Structure that shields friendly mobile units passing nearby.
    Support,
    /// Structure that shoots enemy units in range.
    Turret,
    /// Fast, fragile mobile unit.
    Scout,
    /// Long-range mobile unit that targets structures.
    Demolisher,
    /// Durable mobile unit that hunts enemy mobile units.
    Interceptor,
}

impl UnitType {
    /// All unit types in engine index order.
    pub const ALL: [Self; 6] = [
        Self::Wall,
        Self::Support,
        Self::Turret,
        Self::Scout,
        Self::Demolisher,
        Self::Interceptor,
    ];

    /// Stationary unit types.
    pub const STRUCTURES: [Self; 3] = [Self::Wall, Self::Support, Self::Turret];

    /// Position of this type in the engine's unit tables.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Wall => 0,
            Self::Support => 1,
            Self::Turret => 2,
            Self::Scout => 3,
            Self::Demolisher => 4,
            Self::Interceptor => 5,
        }
    }

    /// Look up a type by engine index.
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Wall),
            1 => Some(Self::Support),
            2 => Some(Self::Turret),
            3 => Some(Self::Scout),
            4 => Some(Self::Demolisher),
            5 => Some(Self::Interceptor),
            _ => None,
        }
    }

    /// Returns true if this type occupies a fixed cell.
    #[must_use]
    pub const fn is_stationary(self) -> bool {
        matches!(self, Self::Wall | Self::Support | Self::Turret)
    }

    /// Returns true if this type walks a path.
    #[must_use]
    pub const fn is_mobile(self) -> bool {
        !self.is_stationary()
    }

    /// Narrow to a mobile kind.
    #[must_use]
    pub const fn mobile(self) -> Option<MobileUnit> {
        match self {
            Self::Scout => Some(MobileUnit::Scout),
            Self::Demolisher => Some(MobileUnit::Demolisher),
            Self::Interceptor => Some(MobileUnit::Interceptor),
            Self::Wall | Self::Support | Self::Turret => None,
        }
    }

    /// Shorthand the stock game config assigns to this type.
    #[must_use]
    pub const fn default_shorthand(self) -> &'static str {
        match self {
            Self::Wall => "FF",
            Self::Support => "EF",
            Self::Turret => "DF",
            Self::Scout => "PI",
            Self::Demolisher => "EI",
            Self::Interceptor => "SI",
        }
    }
}

impl fmt::Display for UnitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Wall => "wall",
            Self::Support => "support",
            Self::Turret => "turret",
            Self::Scout => "scout",
            Self::Demolisher => "demolisher",
            Self::Interceptor => "interceptor",
        };
        f.write_str(name)
    }
}

/// Unit kinds that move along a path each turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MobileUnit {
    /// See [`UnitType::Scout`].
    Scout,
    /// See [`UnitType::Demolisher`].
    Demolisher,
    /// See [`UnitType::Interceptor`].
    Interceptor,
}

impl MobileUnit {
    /// All mobile kinds.
    pub const ALL: [Self; 3] = [Self::Scout, Self::Demolisher, Self::Interceptor];
}

impl From<MobileUnit> for UnitType {
    fn from(unit: MobileUnit) -> Self {
        match unit {
            MobileUnit::Scout => Self::Scout,
            MobileUnit::Demolisher => Self::Demolisher,
            MobileUnit::Interceptor => Self::Interceptor,
        }
    }
}

impl fmt::Display for MobileUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        UnitType::from(*self).fmt(f)
    }
}

/// Which side owns a unit or resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Player {
    /// The agent.
    Friendly,
    /// The opponent.
    Enemy,
}

impl Player {
    /// The other player.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::Friendly => Self::Enemy,
            Self::Enemy => Self::Friendly,
        }
    }

    /// Decode the owner field of action-frame events (1 = us, 2 = them).
    #[must_use]
    pub const fn from_frame_owner(owner: u8) -> Option<Self> {
        match owner {
            1 => Some(Self::Friendly),
            2 => Some(Self::Enemy),
            _ => None,
        }
    }
}

/// The two currencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourcePool {
    /// Spent on stationary units ("structure points").
    Structure,
    /// Spent on mobile units ("mobility points"); decays each turn.
    Mobility,
}

/// A unit as reported by the turn snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    /// Unit kind.
    pub unit_type: UnitType,
    /// Owning player.
    pub owner: Player,
    /// Current health.
    #[serde(with = "decimal_serde")]
    pub health: Fixed,
    /// Whether the structure has been upgraded.
    #[serde(default)]
    pub upgraded: bool,
    /// Whether the owner has flagged the structure for removal.
    #[serde(default)]
    pub pending_removal: bool,
}

impl Unit {
    /// Create a fresh, non-upgraded unit.
    #[must_use]
    pub fn new(unit_type: UnitType, owner: Player, health: Fixed) -> Self {
        Self {
            unit_type,
            owner,
            health,
            upgraded: false,
            pending_removal: false,
        }
    }

    /// Returns true if this unit is a stationary unit owned by `owner`.
    #[must_use]
    pub fn is_structure_of(&self, owner: Player) -> bool {
        self.owner == owner && self.unit_type.is_stationary()
    }
}

//! Side-strength evaluation of enemy flank regions.

use tracing::debug;

use crate::board::BoardQuery;
use crate::grid::{Cell, Flank};
use crate::math::{hundredths, Fixed};
use crate::units::{Player, UnitType};

/// How strongly the enemy holds a set of cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegionStrength {
    /// Weighted count of enemy structures by type.
    pub structural: Fixed,
    /// Total current health of enemy structures.
    pub health: Fixed,
    /// `0.6 * structural + 0.4 * health`.
    pub blended: Fixed,
}

/// Per-type weight in the structural score. Mobile units do not count.
#[must_use]
pub fn structure_weight(unit_type: UnitType) -> Fixed {
    match unit_type {
        UnitType::Support => hundredths(120),
        UnitType::Wall => hundredths(50),
        UnitType::Turret => hundredths(200),
        UnitType::Scout | UnitType::Demolisher | UnitType::Interceptor => Fixed::ZERO,
    }
}

/// Score the enemy structures standing on `cells`.
#[must_use]
pub fn evaluate_region(cells: &[Cell], board: &impl BoardQuery) -> RegionStrength {
    let mut strength = RegionStrength::default();

    for &cell in cells {
        if let Some(unit) = board.stationary_unit_at(cell) {
            if unit.owner == Player::Enemy {
                strength.structural += structure_weight(unit.unit_type);
                strength.health += unit.health;
            }
        }
    }

    strength.blended = hundredths(60) * strength.structural + hundredths(40) * strength.health;
    strength
}

/// Pick the flank whose region scores strictly lower. Ties go right.
#[must_use]
pub fn choose_weaker_side(left: &[Cell], right: &[Cell], board: &impl BoardQuery) -> Flank {
    let left_strength = evaluate_region(left, board);
    let right_strength = evaluate_region(right, board);

    debug!(
        left_structural = %left_strength.structural,
        left_blended = %left_strength.blended,
        right_structural = %right_strength.structural,
        right_blended = %right_strength.blended,
        "Compared flank strength"
    );

    if left_strength.blended < right_strength.blended {
        Flank::Left
    } else {
        Flank::Right
    }
}

/// Check if more than `limit` enemy units of any kind occupy the region.
#[must_use]
pub fn flank_is_crowded(cells: &[Cell], board: &impl BoardQuery, limit: u32) -> bool {
    let enemies = cells
        .iter()
        .flat_map(|&cell| board.units_at(cell))
        .filter(|unit| unit.owner == Player::Enemy)
        .count();
    enemies > usize::try_from(limit).unwrap_or(usize::MAX)
}

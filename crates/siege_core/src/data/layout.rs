//! Fixed defensive layouts, kept as data rather than code.

use serde::{Deserialize, Serialize};

use crate::board::BoardQuery;
use crate::grid::{Cell, Flank};

/// Static defensive layout built every turn.
///
/// Each list is attempted in order; the builder stops placing a list once
/// resources run out.
///
/// # Example RON
///
/// ```ron
/// DefenseLayout(
///     priority_turrets: [(0, 13), (27, 13)],
///     supports: [(4, 12), (23, 12)],
///     walls: [(5, 12), (22, 12)],
///     turrets: [(3, 12), (24, 12)],
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DefenseLayout {
    /// Turrets placed first, along the front corners.
    #[serde(default)]
    pub priority_turrets: Vec<Cell>,
    /// Support structures.
    #[serde(default)]
    pub supports: Vec<Cell>,
    /// Wall line.
    #[serde(default)]
    pub walls: Vec<Cell>,
    /// Remaining turret line.
    #[serde(default)]
    pub turrets: Vec<Cell>,
}

/// Everything the strategy knows about one flank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlankPlan {
    /// Which flank this plan covers.
    pub flank: Flank,
    /// Our cells cleared to open the attack lane.
    pub breach: Vec<Cell>,
    /// Enemy cells scored to judge the flank's strength.
    pub enemy_triangle: Vec<Cell>,
    /// Friendly supports that must stand for the wave to go without escorts.
    #[serde(default)]
    pub required_supports: Vec<Cell>,
    /// Enemy wall shape that calls for a demolisher vanguard.
    #[serde(default)]
    pub enemy_pattern: Option<EnemyPattern>,
}

/// A wall shape on the enemy's side of a flank.
///
/// # Example RON
///
/// ```ron
/// EnemyPattern(
///     walls: [(0, 14), (1, 15), (2, 15), (3, 15)],
///     empty: [(1, 14), (2, 14), (3, 14), (4, 14)],
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemyPattern {
    /// Cells that must all hold a structure.
    pub walls: Vec<Cell>,
    /// Cells that must all be free of structures.
    #[serde(default)]
    pub empty: Vec<Cell>,
}

impl EnemyPattern {
    /// Check the board shows this shape.
    #[must_use]
    pub fn matches(&self, board: &impl BoardQuery) -> bool {
        self.walls.iter().all(|&cell| board.has_stationary_unit(cell))
            && !self.empty.iter().any(|&cell| board.has_stationary_unit(cell))
    }
}

impl FlankPlan {
    /// Stock left-flank plan for the standard arena.
    #[must_use]
    pub fn standard_left() -> Self {
        Self {
            flank: Flank::Left,
            breach: vec![Cell::new(1, 13)],
            enemy_triangle: cells(&[
                (3, 17),
                (2, 16),
                (3, 16),
                (1, 15),
                (2, 15),
                (3, 15),
                (0, 14),
                (1, 14),
                (2, 14),
                (3, 14),
            ]),
            required_supports: cells(&[(4, 12), (7, 9)]),
            enemy_pattern: Some(EnemyPattern {
                walls: cells(&[(0, 14), (1, 15), (2, 15), (3, 15)]),
                empty: cells(&[(1, 14), (2, 14), (3, 14), (4, 14)]),
            }),
        }
    }

    /// Stock right-flank plan for the standard arena.
    #[must_use]
    pub fn standard_right() -> Self {
        Self {
            flank: Flank::Right,
            breach: vec![Cell::new(26, 13)],
            enemy_triangle: cells(&[
                (24, 17),
                (24, 16),
                (25, 16),
                (24, 15),
                (25, 15),
                (26, 15),
                (24, 14),
                (25, 14),
                (26, 14),
                (27, 14),
            ]),
            required_supports: cells(&[(23, 12), (20, 9)]),
            enemy_pattern: Some(EnemyPattern {
                walls: cells(&[(27, 14), (26, 15), (25, 15), (24, 15)]),
                empty: cells(&[(23, 14), (24, 14), (25, 14), (26, 14)]),
            }),
        }
    }
}

impl DefenseLayout {
    /// Stock layout: corner turrets, four supports, a wall line at row 11
    /// and a turret line at row 10.
    #[must_use]
    pub fn standard() -> Self {
        let mut walls = cells(&[(5, 12), (3, 13), (22, 12), (24, 13)]);
        walls.extend((5..23).map(|x| Cell::new(x, 11)));
        walls.extend(cells(&[(7, 10), (11, 10), (16, 10), (20, 10)]));

        let mut turrets = cells(&[(3, 12), (4, 11), (24, 12), (23, 11)]);
        turrets.extend((0..4).map(|x| Cell::new(x, 13)));
        turrets.extend((25..28).map(|x| Cell::new(x, 13)));
        turrets.extend(cells(&[
            (5, 10),
            (6, 10),
            (9, 10),
            (10, 10),
            (12, 10),
            (13, 10),
            (14, 10),
            (15, 10),
            (17, 10),
            (18, 10),
            (21, 10),
            (22, 10),
        ]));

        Self {
            priority_turrets: cells(&[
                (0, 13),
                (27, 13),
                (1, 13),
                (26, 13),
                (2, 13),
                (25, 13),
                (4, 13),
                (23, 13),
            ]),
            supports: cells(&[(4, 12), (23, 12), (7, 9), (20, 9)]),
            walls,
            turrets,
        }
    }
}

fn cells(coords: &[(i32, i32)]) -> Vec<Cell> {
    coords.iter().copied().map(Cell::from).collect()
}

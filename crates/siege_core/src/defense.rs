//! Defensive structure placement and upgrades.

use tracing::debug;

use crate::board::BoardQuery;
use crate::data::{DefenseLayout, StallConfig};
use crate::grid::Cell;
use crate::intents::TurnPlan;
use crate::units::UnitType;

/// Places the fixed layout plus reactive structures, never touching the
/// cells reserved for an open breach.
#[derive(Debug, Clone, Copy)]
pub struct DefenseBuilder<'a> {
    layout: &'a DefenseLayout,
    keep_clear: &'a [Cell],
}

impl<'a> DefenseBuilder<'a> {
    /// Create a builder that skips `keep_clear`.
    #[must_use]
    pub const fn new(layout: &'a DefenseLayout, keep_clear: &'a [Cell]) -> Self {
        Self { layout, keep_clear }
    }

    fn open(&self, cells: &[Cell]) -> Vec<Cell> {
        cells
            .iter()
            .copied()
            .filter(|cell| !self.keep_clear.contains(cell))
            .collect()
    }

    /// Place the layout in priority order, then reinforce every cell the
    /// enemy has scored on. Returns the number of structures placed.
    pub fn build(&self, board: &impl BoardQuery, plan: &mut TurnPlan, scored_on: &[Cell]) -> u32 {
        let mut placed = 0;
        placed += plan.spawn_each(board, UnitType::Turret, &self.open(&self.layout.priority_turrets));
        placed += plan.spawn_each(board, UnitType::Support, &self.open(&self.layout.supports));
        placed += plan.spawn_each(board, UnitType::Wall, &self.open(&self.layout.walls));
        placed += plan.spawn_each(board, UnitType::Turret, &self.open(&self.layout.turrets));

        for &cell in scored_on {
            placed += self.reinforce(board, plan, cell);
        }

        debug!(placed, "Built defenses");
        placed
    }

    /// Turret cluster behind a scored-on cell and a wall screen beside it.
    fn reinforce(&self, board: &impl BoardQuery, plan: &mut TurnPlan, at: Cell) -> u32 {
        let Cell { x, y } = at;
        let cluster = [
            Cell::new(x, y),
            Cell::new(x, y + 1),
            Cell::new(x + 1, y + 1),
            Cell::new(x - 1, y + 1),
        ];
        let screen = [Cell::new(x, y), Cell::new(x + 1, y), Cell::new(x - 1, y)];

        plan.spawn_each(board, UnitType::Turret, &self.open(&cluster))
            + plan.spawn_each(board, UnitType::Wall, &self.open(&screen))
    }

    /// Spend leftover structure points: missing supports first, then
    /// upgrades in layout order. Returns the number of actions accepted.
    pub fn upgrade(&self, board: &impl BoardQuery, plan: &mut TurnPlan) -> u32 {
        let mut upgraded = 0;
        upgraded += plan.spawn_each(board, UnitType::Support, &self.open(&self.layout.supports));
        upgraded += plan.upgrade_each(board, &self.open(&self.layout.priority_turrets));
        upgraded += plan.upgrade_each(board, &self.open(&self.layout.turrets));
        upgraded += plan.upgrade_each(board, &self.open(&self.layout.walls));
        debug!(upgraded, "Upgraded defenses");
        upgraded
    }
}

/// Deploy one interceptor per stall cell during the opening turns once the
/// opponent has shown a demolisher. Returns the number deployed.
pub fn stall_with_interceptors(
    board: &impl BoardQuery,
    plan: &mut TurnPlan,
    stall: &StallConfig,
    opponent_sent_demolisher: bool,
) -> u32 {
    if !opponent_sent_demolisher || board.turn_number() > stall.until_turn {
        return 0;
    }
    stall
        .cells
        .iter()
        .map(|&cell| plan.spawn(board, UnitType::Interceptor, cell, 1))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{GameState, PlayerStats};
    use crate::data::GameConfig;
    use crate::intents::Intent;
    use crate::math::Fixed;
    use crate::units::Player;

    fn board(turn: u32, structure: i32, mobility: i32) -> GameState {
        let mut state = GameState::new(GameConfig::default(), turn);
        state.set_player_stats(
            Player::Friendly,
            PlayerStats {
                health: Fixed::from_num(30),
                structure_points: Fixed::from_num(structure),
                mobility_points: Fixed::from_num(mobility),
            },
        );
        state
    }

    fn spawned_cells(plan: &TurnPlan) -> Vec<Cell> {
        plan.intents()
            .iter()
            .filter_map(|intent| match intent {
                Intent::Spawn { cell, .. } => Some(*cell),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_priority_turrets_first() {
        let state = board(0, 6, 0);
        let layout = DefenseLayout::standard();
        let mut plan = TurnPlan::new(&state);

        let placed = DefenseBuilder::new(&layout, &[]).build(&state, &mut plan, &[]);
        assert_eq!(placed, 3);
        assert_eq!(spawned_cells(&plan), layout.priority_turrets[..3].to_vec());
    }

    #[test]
    fn test_breach_cells_stay_open() {
        let state = board(0, 100, 0);
        let layout = DefenseLayout::standard();
        let breach = [Cell::new(1, 13)];
        let mut plan = TurnPlan::new(&state);

        DefenseBuilder::new(&layout, &breach).build(&state, &mut plan, &[]);
        assert!(!spawned_cells(&plan).contains(&Cell::new(1, 13)));
        assert!(spawned_cells(&plan).contains(&Cell::new(26, 13)));
    }

    #[test]
    fn test_reactive_cluster() {
        let state = board(0, 100, 0);
        let layout = DefenseLayout::default();
        let mut plan = TurnPlan::new(&state);

        let placed = DefenseBuilder::new(&layout, &[]).build(&state, &mut plan, &[Cell::new(10, 7)]);
        // Four turrets, then two walls beside the turret on (10, 7).
        assert_eq!(placed, 6);
        assert_eq!(
            plan.intents()[0],
            Intent::Spawn {
                unit_type: UnitType::Turret,
                cell: Cell::new(10, 7),
                count: 1
            }
        );
    }

    #[test]
    fn test_upgrades_after_supports() {
        let mut state = board(0, 6, 0);
        state
            .place(UnitType::Wall, Player::Friendly, Cell::new(5, 12))
            .unwrap();
        let layout = DefenseLayout::standard();
        let mut plan = TurnPlan::new(&state);

        let done = DefenseBuilder::new(&layout, &[]).upgrade(&state, &mut plan);
        // One support on (4, 12) then the (5, 12) wall upgrade.
        assert_eq!(done, 2);
        assert_eq!(plan.intents().last(), Some(&Intent::Upgrade(Cell::new(5, 12))));
    }

    #[test]
    fn test_stall_only_early_after_demolisher() {
        let stall = StallConfig::default();

        let early = board(1, 0, 5);
        let mut plan = TurnPlan::new(&early);
        assert_eq!(stall_with_interceptors(&early, &mut plan, &stall, false), 0);
        assert_eq!(stall_with_interceptors(&early, &mut plan, &stall, true), 2);

        let late = board(3, 0, 5);
        let mut plan = TurnPlan::new(&late);
        assert_eq!(stall_with_interceptors(&late, &mut plan, &stall, true), 0);
    }
}

//! Board queries over one turn snapshot.
//!
//! [`BoardQuery`] is the seam between the decision logic and the game
//! state: the risk model, side evaluator and state machine only ever see a
//! `&impl BoardQuery`. [`GameState`] is the concrete snapshot the driver
//! builds from the engine's JSON.

use std::cell::OnceCell;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::data::{GameConfig, UnitStats};
use crate::error::{Result, SiegeError};
use crate::grid::{ArenaGeometry, Cell, Edge};
use crate::math::{decimal_serde, round_to_tenths, Fixed};
use crate::pathfinding::{find_path_to_edge, NavGrid};
use crate::units::{Player, ResourcePool, Unit, UnitType};

/// Read-only view of the battlefield for one turn.
pub trait BoardQuery {
    /// Arena dimensions.
    fn arena(&self) -> ArenaGeometry;

    /// Turn number of the snapshot.
    fn turn_number(&self) -> u32;

    /// Stats for a unit type.
    fn unit_stats(&self, unit_type: UnitType) -> &UnitStats;

    /// All units on a cell; empty for free or out-of-bounds cells.
    fn units_at(&self, cell: Cell) -> &[Unit];

    /// Units able to attack `cell` on behalf of `for_player`'s opponent.
    ///
    /// `for_player` is the player whose units would stand on the cell.
    fn attackers_of(&self, cell: Cell, for_player: Player) -> Vec<&Unit>;

    /// Path a mobile unit spawned on `cell` would walk, or `None` if the
    /// cell cannot host a walker.
    fn path_to_edge(&self, cell: Cell) -> Option<Vec<Cell>>;

    /// Current amount in a resource pool.
    fn resource(&self, pool: ResourcePool, player: Player) -> Fixed;

    /// Projected amount in a resource pool `turns_ahead` turns from now,
    /// assuming nothing is spent.
    fn projected_resource(&self, pool: ResourcePool, turns_ahead: u32, player: Player) -> Fixed;

    /// Remaining health of a player.
    fn health(&self, player: Player) -> Fixed;

    /// Check if we may place a unit here, ignoring cost.
    fn can_place(&self, unit_type: UnitType, cell: Cell) -> bool;

    /// Check if a cell is inside the arena.
    fn in_bounds(&self, cell: Cell) -> bool {
        self.arena().in_bounds(cell)
    }

    /// The stationary unit on a cell, if any.
    fn stationary_unit_at(&self, cell: Cell) -> Option<&Unit> {
        self.units_at(cell)
            .iter()
            .find(|unit| unit.unit_type.is_stationary())
    }

    /// Check if a structure stands on a cell.
    fn has_stationary_unit(&self, cell: Cell) -> bool {
        self.stationary_unit_at(cell).is_some()
    }

    /// Check if we may spawn `unit_type` on `cell` with our current
    /// resources.
    fn is_legal_spawn(&self, unit_type: UnitType, cell: Cell) -> bool {
        if !self.can_place(unit_type, cell) {
            return false;
        }
        let stats = self.unit_stats(unit_type);
        [ResourcePool::Structure, ResourcePool::Mobility]
            .into_iter()
            .all(|pool| self.resource(pool, Player::Friendly) >= stats.cost(pool))
    }

    /// Cells along an edge.
    fn edge_cells(&self, edge: Edge) -> Vec<Cell> {
        self.arena().edge_cells(edge)
    }
}

/// Health and resource pools of one player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PlayerStats {
    /// Remaining health.
    #[serde(with = "decimal_serde")]
    pub health: Fixed,
    /// Structure points.
    #[serde(with = "decimal_serde")]
    pub structure_points: Fixed,
    /// Mobility points.
    #[serde(with = "decimal_serde")]
    pub mobility_points: Fixed,
}

impl PlayerStats {
    fn pool(&self, pool: ResourcePool) -> Fixed {
        match pool {
            ResourcePool::Structure => self.structure_points,
            ResourcePool::Mobility => self.mobility_points,
        }
    }
}

/// Fully materialized snapshot of one turn.
///
/// # Example
///
/// ```
/// use siege_core::board::{BoardQuery, GameState};
/// use siege_core::data::GameConfig;
/// use siege_core::grid::Cell;
/// use siege_core::units::{Player, UnitType};
///
/// let mut state = GameState::new(GameConfig::default(), 3);
/// state.place(UnitType::Turret, Player::Enemy, Cell::new(13, 16)).unwrap();
///
/// assert!(state.has_stationary_unit(Cell::new(13, 16)));
/// assert_eq!(state.attackers_of(Cell::new(13, 14), Player::Friendly).len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct GameState {
    config: GameConfig,
    turn_number: u32,
    units: BTreeMap<Cell, Vec<Unit>>,
    friendly: PlayerStats,
    enemy: PlayerStats,
    nav: OnceCell<NavGrid>,
}

impl GameState {
    /// Create an empty board for the given turn.
    #[must_use]
    pub fn new(config: GameConfig, turn_number: u32) -> Self {
        Self {
            config,
            turn_number,
            units: BTreeMap::new(),
            friendly: PlayerStats::default(),
            enemy: PlayerStats::default(),
            nav: OnceCell::new(),
        }
    }

    /// Rules in effect.
    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Set a player's health and resources.
    pub fn set_player_stats(&mut self, player: Player, stats: PlayerStats) {
        match player {
            Player::Friendly => self.friendly = stats,
            Player::Enemy => self.enemy = stats,
        }
    }

    /// A player's health and resources.
    #[must_use]
    pub fn player_stats(&self, player: Player) -> &PlayerStats {
        match player {
            Player::Friendly => &self.friendly,
            Player::Enemy => &self.enemy,
        }
    }

    /// Add a unit to the board.
    ///
    /// # Errors
    ///
    /// Returns `SiegeError::SnapshotParse` if the cell is outside the arena
    /// or a second structure is stacked on an occupied cell.
    pub fn add_unit(&mut self, cell: Cell, unit: Unit) -> Result<()> {
        if !self.config.arena.in_bounds(cell) {
            return Err(SiegeError::SnapshotParse(format!(
                "{} at {cell} is outside the arena",
                unit.unit_type
            )));
        }
        let occupants = self.units.entry(cell).or_default();
        if unit.unit_type.is_stationary()
            && occupants.iter().any(|u| u.unit_type.is_stationary())
        {
            return Err(SiegeError::SnapshotParse(format!(
                "second structure on {cell}"
            )));
        }
        occupants.push(unit);
        self.nav = OnceCell::new();
        Ok(())
    }

    /// Add a full-health unit of the given type.
    ///
    /// # Errors
    ///
    /// See [`GameState::add_unit`].
    pub fn place(&mut self, unit_type: UnitType, owner: Player, cell: Cell) -> Result<()> {
        let health = self.config.stats(unit_type).health;
        self.add_unit(cell, Unit::new(unit_type, owner, health))
    }

    /// Mutable access to the structure on a cell, for snapshot markers.
    pub fn stationary_unit_mut(&mut self, cell: Cell) -> Option<&mut Unit> {
        self.units
            .get_mut(&cell)?
            .iter_mut()
            .find(|unit| unit.unit_type.is_stationary())
    }

    /// Iterate over every occupied cell and its units, in cell order.
    pub fn iter_units(&self) -> impl Iterator<Item = (Cell, &Unit)> {
        self.units
            .iter()
            .flat_map(|(cell, units)| units.iter().map(move |unit| (*cell, unit)))
    }

    fn nav_grid(&self) -> &NavGrid {
        self.nav.get_or_init(|| {
            NavGrid::from_fn(self.config.arena, |cell| {
                self.units
                    .get(&cell)
                    .is_some_and(|units| units.iter().any(|u| u.unit_type.is_stationary()))
            })
        })
    }
}

impl BoardQuery for GameState {
    fn arena(&self) -> ArenaGeometry {
        self.config.arena
    }

    fn turn_number(&self) -> u32 {
        self.turn_number
    }

    fn unit_stats(&self, unit_type: UnitType) -> &UnitStats {
        self.config.stats(unit_type)
    }

    fn units_at(&self, cell: Cell) -> &[Unit] {
        self.units.get(&cell).map_or(&[], Vec::as_slice)
    }

    fn attackers_of(&self, cell: Cell, for_player: Player) -> Vec<&Unit> {
        let attacker = for_player.opponent();
        self.iter_units()
            .filter(|(_, unit)| unit.is_structure_of(attacker))
            .filter(|(origin, unit)| {
                let stats = self.config.stats(unit.unit_type);
                let damage = stats.damage_to_mobile(unit.upgraded);
                if damage <= Fixed::ZERO {
                    return false;
                }
                let range = stats.attack_range(unit.upgraded);
                Fixed::from_num(origin.distance_squared(cell)) <= range * range
            })
            .map(|(_, unit)| unit)
            .collect()
    }

    fn path_to_edge(&self, cell: Cell) -> Option<Vec<Cell>> {
        let target = self.config.arena.target_edge(cell);
        find_path_to_edge(self.nav_grid(), cell, target)
    }

    fn resource(&self, pool: ResourcePool, player: Player) -> Fixed {
        self.player_stats(player).pool(pool)
    }

    fn projected_resource(&self, pool: ResourcePool, turns_ahead: u32, player: Player) -> Fixed {
        let rules = &self.config.resources;
        let mut amount = self.resource(pool, player);

        for step in 1..=turns_ahead {
            match pool {
                ResourcePool::Mobility => {
                    let turn = self.turn_number + step;
                    let ramp_ups = turn / rules.growth_interval.max(1);
                    amount *= Fixed::ONE - rules.mobility_decay_per_round;
                    amount += rules.mobility_per_round
                        + rules.mobility_growth_rate * Fixed::from_num(ramp_ups);
                    amount = round_to_tenths(amount);
                }
                ResourcePool::Structure => amount += rules.structure_per_round,
            }
        }

        amount
    }

    fn health(&self, player: Player) -> Fixed {
        self.player_stats(player).health
    }

    fn can_place(&self, unit_type: UnitType, cell: Cell) -> bool {
        let arena = self.config.arena;
        if !arena.is_friendly_territory(cell) {
            return false;
        }
        if unit_type.is_stationary() {
            return self.units_at(cell).is_empty();
        }
        let on_deploy_edge =
            arena.is_on_edge(cell, Edge::BottomLeft) || arena.is_on_edge(cell, Edge::BottomRight);
        on_deploy_edge && !self.has_stationary_unit(cell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board() -> GameState {
        GameState::new(GameConfig::default(), 5)
    }

    fn with_resources(mut state: GameState, structure: i32, mobility: f64) -> GameState {
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

    #[test]
    fn test_stationary_queries() {
        let mut state = board();
        state
            .place(UnitType::Wall, Player::Friendly, Cell::new(5, 11))
            .unwrap();
        state
            .place(UnitType::Scout, Player::Friendly, Cell::new(6, 11))
            .unwrap();

        assert!(state.has_stationary_unit(Cell::new(5, 11)));
        assert!(!state.has_stationary_unit(Cell::new(6, 11)));
        assert_eq!(state.units_at(Cell::new(6, 11)).len(), 1);
        assert!(state.units_at(Cell::new(0, 0)).is_empty());
    }

    #[test]
    fn test_rejects_stacked_structures_and_out_of_bounds() {
        let mut state = board();
        state
            .place(UnitType::Wall, Player::Friendly, Cell::new(5, 11))
            .unwrap();
        assert!(state
            .place(UnitType::Turret, Player::Friendly, Cell::new(5, 11))
            .is_err());
        assert!(state
            .place(UnitType::Wall, Player::Friendly, Cell::new(0, 0))
            .is_err());
    }

    #[test]
    fn test_attackers_respect_range_and_owner() {
        let mut state = board();
        state
            .place(UnitType::Turret, Player::Enemy, Cell::new(13, 16))
            .unwrap();
        state
            .place(UnitType::Wall, Player::Enemy, Cell::new(13, 15))
            .unwrap();
        state
            .place(UnitType::Turret, Player::Friendly, Cell::new(13, 13))
            .unwrap();

        // Distance 2: inside range 2.5.
        assert_eq!(state.attackers_of(Cell::new(13, 14), Player::Friendly).len(), 1);
        // Distance 3: outside base range.
        assert!(state.attackers_of(Cell::new(13, 13), Player::Friendly).is_empty());
        // Our own turret only threatens enemy walkers.
        assert_eq!(state.attackers_of(Cell::new(13, 14), Player::Enemy).len(), 1);
    }

    #[test]
    fn test_upgraded_turret_reaches_further() {
        let mut state = board();
        let mut turret = Unit::new(UnitType::Turret, Player::Enemy, Fixed::from_num(75));
        turret.upgraded = true;
        state.add_unit(Cell::new(13, 16), turret).unwrap();

        assert_eq!(state.attackers_of(Cell::new(13, 13), Player::Friendly).len(), 1);
    }

    #[test]
    fn test_spawn_legality() {
        let mut state = with_resources(board(), 10, 3.0);
        state
            .place(UnitType::Wall, Player::Friendly, Cell::new(12, 1))
            .unwrap();

        assert!(state.is_legal_spawn(UnitType::Scout, Cell::new(13, 0)));
        // Blocked deploy cell.
        assert!(!state.is_legal_spawn(UnitType::Scout, Cell::new(12, 1)));
        // Not on a deploy edge.
        assert!(!state.is_legal_spawn(UnitType::Scout, Cell::new(13, 5)));
        // Enemy territory.
        assert!(!state.is_legal_spawn(UnitType::Wall, Cell::new(13, 20)));
        // Too expensive: demolishers cost 3, interceptors 1.
        assert!(state.is_legal_spawn(UnitType::Demolisher, Cell::new(13, 0)));
        let poor = with_resources(board(), 0, 0.5);
        assert!(!poor.is_legal_spawn(UnitType::Interceptor, Cell::new(13, 0)));
        assert!(!poor.is_legal_spawn(UnitType::Wall, Cell::new(13, 5)));
    }

    #[test]
    fn test_mobile_on_cell_blocks_structure_only() {
        let mut state = with_resources(board(), 10, 10.0);
        state
            .place(UnitType::Scout, Player::Friendly, Cell::new(13, 0))
            .unwrap();
        assert!(!state.can_place(UnitType::Wall, Cell::new(13, 0)));
        assert!(state.can_place(UnitType::Scout, Cell::new(13, 0)));
    }

    #[test]
    fn test_projected_mobility() {
        let state = with_resources(board(), 0, 10.0);
        // Turn 6: 10 * 0.75 + 5 + 1 * (6 / 10) = 12.5
        assert_eq!(
            state.projected_resource(ResourcePool::Mobility, 1, Player::Friendly),
            Fixed::from_num(12.5)
        );
        // Turn 7: 12.5 * 0.75 + 5 = 14.375 -> 14.4
        assert_eq!(
            state.projected_resource(ResourcePool::Mobility, 2, Player::Friendly),
            round_to_tenths(Fixed::from_num(14.4))
        );
    }

    #[test]
    fn test_projected_mobility_includes_ramp() {
        let state = with_resources(GameState::new(GameConfig::default(), 9), 0, 0.0);
        // Turn 10 is the first ramp-up: 0 + 5 + 1.
        assert_eq!(
            state.projected_resource(ResourcePool::Mobility, 1, Player::Friendly),
            Fixed::from_num(6)
        );
    }

    #[test]
    fn test_path_invalidated_by_new_structure() {
        let mut state = board();
        let open = state.path_to_edge(Cell::new(13, 0)).unwrap();
        assert!(open.contains(&Cell::new(13, 1)));

        state
            .place(UnitType::Wall, Player::Friendly, Cell::new(13, 1))
            .unwrap();
        let rerouted = state.path_to_edge(Cell::new(13, 0)).unwrap();
        assert!(!rerouted.contains(&Cell::new(13, 1)));
        assert!(state.path_to_edge(Cell::new(13, 1)).is_none());
    }
}

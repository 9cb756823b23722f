//! Test fixtures and helpers.
//!
//! [`BoardBuilder`] assembles turn snapshots without going through the
//! engine's JSON. [`ScriptedBoard`] wraps a snapshot and replaces the
//! pathing with hand-written paths, so risk scenarios can pin exact factor
//! values.

use std::collections::BTreeMap;

use fixed::types::I32F32;
use siege_core::board::{BoardQuery, GameState, PlayerStats};
use siege_core::data::{GameConfig, UnitStats};
use siege_core::grid::{ArenaGeometry, Cell};
use siege_core::units::{Player, ResourcePool, Unit, UnitType};

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a fixed-point number from tenths, e.g. `tenths(139)` is 13.9.
#[must_use]
pub fn tenths(n: i32) -> I32F32 {
    I32F32::from_num(n) / I32F32::from_num(10)
}

/// Builder for [`GameState`] snapshots.
///
/// # Example
///
/// ```
/// use siege_core::board::BoardQuery;
/// use siege_core::grid::Cell;
/// use siege_core::units::{Player, UnitType};
/// use siege_test_utils::fixtures::BoardBuilder;
///
/// let board = BoardBuilder::new()
///     .turn(3)
///     .resources(10, 8)
///     .structure(UnitType::Turret, Player::Enemy, Cell::new(13, 16))
///     .build();
///
/// assert_eq!(board.turn_number(), 3);
/// assert!(board.has_stationary_unit(Cell::new(13, 16)));
/// ```
#[derive(Debug, Clone)]
pub struct BoardBuilder {
    config: GameConfig,
    turn: u32,
    friendly: PlayerStats,
    enemy: PlayerStats,
    units: Vec<(Cell, Unit)>,
}

impl Default for BoardBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BoardBuilder {
    /// Empty turn-0 board with stock rules and both players at 30 health.
    #[must_use]
    pub fn new() -> Self {
        let stats = PlayerStats {
            health: fixed(30),
            ..PlayerStats::default()
        };
        Self {
            config: GameConfig::default(),
            turn: 0,
            friendly: stats,
            enemy: stats,
            units: Vec::new(),
        }
    }

    /// Replace the rules.
    #[must_use]
    pub fn config(mut self, config: GameConfig) -> Self {
        self.config = config;
        self
    }

    /// Adjust one unit type's stats.
    #[must_use]
    pub fn stats(mut self, unit_type: UnitType, edit: impl FnOnce(&mut UnitStats)) -> Self {
        edit(self.config.units.get_mut(unit_type));
        self
    }

    /// Set the turn number.
    #[must_use]
    pub fn turn(mut self, turn: u32) -> Self {
        self.turn = turn;
        self
    }

    /// Set our structure and mobility points.
    #[must_use]
    pub fn resources(mut self, structure: i32, mobility: i32) -> Self {
        self.friendly.structure_points = fixed(structure);
        self.friendly.mobility_points = fixed(mobility);
        self
    }

    /// Set our mobility points exactly.
    #[must_use]
    pub fn mobility(mut self, mobility: I32F32) -> Self {
        self.friendly.mobility_points = mobility;
        self
    }

    /// Set the enemy's health.
    #[must_use]
    pub fn enemy_health(mut self, health: i32) -> Self {
        self.enemy.health = fixed(health);
        self
    }

    /// Add a full-health structure.
    #[must_use]
    pub fn structure(self, unit_type: UnitType, owner: Player, cell: Cell) -> Self {
        let health = self.config.stats(unit_type).health;
        self.unit(cell, Unit::new(unit_type, owner, health))
    }

    /// Add several full-health structures of one type.
    #[must_use]
    pub fn structures(mut self, unit_type: UnitType, owner: Player, cells: &[Cell]) -> Self {
        for &cell in cells {
            self = self.structure(unit_type, owner, cell);
        }
        self
    }

    /// Add an upgraded full-health structure.
    #[must_use]
    pub fn upgraded(self, unit_type: UnitType, owner: Player, cell: Cell) -> Self {
        let health = self.config.stats(unit_type).health;
        let mut unit = Unit::new(unit_type, owner, health);
        unit.upgraded = true;
        self.unit(cell, unit)
    }

    /// Add an arbitrary unit.
    #[must_use]
    pub fn unit(mut self, cell: Cell, unit: Unit) -> Self {
        self.units.push((cell, unit));
        self
    }

    /// Build the snapshot, silently skipping units the board rejects.
    #[must_use]
    pub fn build(self) -> GameState {
        let mut state = GameState::new(self.config, self.turn);
        state.set_player_stats(Player::Friendly, self.friendly);
        state.set_player_stats(Player::Enemy, self.enemy);
        for (cell, unit) in self.units {
            if state.add_unit(cell, unit).is_err() {
                tracing::debug!(%cell, "Fixture unit rejected");
            }
        }
        state
    }
}

/// A board whose paths are scripted per start cell.
///
/// Every other query is answered by the wrapped [`GameState`]. Start cells
/// without a script have no path.
#[derive(Debug, Clone)]
pub struct ScriptedBoard {
    inner: GameState,
    paths: BTreeMap<Cell, Vec<Cell>>,
}

impl ScriptedBoard {
    /// Wrap a snapshot with no scripted paths.
    #[must_use]
    pub fn new(inner: GameState) -> Self {
        Self {
            inner,
            paths: BTreeMap::new(),
        }
    }

    /// Script the path walked from `start`. The start cell is prepended.
    #[must_use]
    pub fn with_path(mut self, start: Cell, rest: &[Cell]) -> Self {
        let mut path = Vec::with_capacity(rest.len() + 1);
        path.push(start);
        path.extend_from_slice(rest);
        self.paths.insert(start, path);
        self
    }

    /// Wrapped snapshot.
    #[must_use]
    pub fn inner(&self) -> &GameState {
        &self.inner
    }
}

impl BoardQuery for ScriptedBoard {
    fn arena(&self) -> ArenaGeometry {
        self.inner.arena()
    }

    fn turn_number(&self) -> u32 {
        self.inner.turn_number()
    }

    fn unit_stats(&self, unit_type: UnitType) -> &UnitStats {
        self.inner.unit_stats(unit_type)
    }

    fn units_at(&self, cell: Cell) -> &[Unit] {
        self.inner.units_at(cell)
    }

    fn attackers_of(&self, cell: Cell, for_player: Player) -> Vec<&Unit> {
        self.inner.attackers_of(cell, for_player)
    }

    fn path_to_edge(&self, cell: Cell) -> Option<Vec<Cell>> {
        self.paths.get(&cell).cloned()
    }

    fn resource(&self, pool: ResourcePool, player: Player) -> I32F32 {
        self.inner.resource(pool, player)
    }

    fn projected_resource(&self, pool: ResourcePool, turns_ahead: u32, player: Player) -> I32F32 {
        self.inner.projected_resource(pool, turns_ahead, player)
    }

    fn health(&self, player: Player) -> I32F32 {
        self.inner.health(player)
    }

    fn can_place(&self, unit_type: UnitType, cell: Cell) -> bool {
        self.inner.can_place(unit_type, cell)
    }
}

/// Bottom-edge cells of the stock arena, left edge first.
#[must_use]
pub fn deploy_cells() -> Vec<Cell> {
    ArenaGeometry::default().deployment_cells()
}

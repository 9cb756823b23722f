//! Turn intents and the plan that accumulates them.
//!
//! A [`TurnPlan`] mirrors what the engine will accept this turn: it tracks
//! the spendable pools and the cells already claimed, so later requests see
//! the effect of earlier ones. Rejected requests are simply not recorded.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::board::BoardQuery;
use crate::grid::Cell;
use crate::math::Fixed;
use crate::units::{Player, ResourcePool, UnitType};

/// One action submitted to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Intent {
    /// Flag one of our structures for removal.
    Remove(Cell),
    /// Place `count` units of a type on a cell.
    Spawn {
        /// Unit type.
        unit_type: UnitType,
        /// Target cell.
        cell: Cell,
        /// Number of units; always 1 for structures.
        count: u32,
    },
    /// Upgrade one of our structures.
    Upgrade(Cell),
}

impl Intent {
    /// Submission phase; intents are emitted in ascending phase.
    #[must_use]
    pub const fn phase(&self) -> u8 {
        match self {
            Self::Remove(_) => 0,
            Self::Spawn { .. } => 1,
            Self::Upgrade(_) => 2,
        }
    }
}

/// Intents accepted so far this turn.
#[derive(Debug, Clone)]
pub struct TurnPlan {
    structure_points: Fixed,
    mobility_points: Fixed,
    intents: Vec<Intent>,
    placed: BTreeMap<Cell, UnitType>,
    deployed: BTreeSet<Cell>,
    removed: BTreeSet<Cell>,
    upgraded: BTreeSet<Cell>,
}

impl TurnPlan {
    /// Start a plan with our current resources.
    #[must_use]
    pub fn new(board: &impl BoardQuery) -> Self {
        Self {
            structure_points: board.resource(ResourcePool::Structure, Player::Friendly),
            mobility_points: board.resource(ResourcePool::Mobility, Player::Friendly),
            intents: Vec::new(),
            placed: BTreeMap::new(),
            deployed: BTreeSet::new(),
            removed: BTreeSet::new(),
            upgraded: BTreeSet::new(),
        }
    }

    /// Points left to spend in a pool.
    #[must_use]
    pub fn budget(&self, pool: ResourcePool) -> Fixed {
        match pool {
            ResourcePool::Structure => self.structure_points,
            ResourcePool::Mobility => self.mobility_points,
        }
    }

    fn budget_mut(&mut self, pool: ResourcePool) -> &mut Fixed {
        match pool {
            ResourcePool::Structure => &mut self.structure_points,
            ResourcePool::Mobility => &mut self.mobility_points,
        }
    }

    /// Intents recorded so far, in request order.
    #[must_use]
    pub fn intents(&self) -> &[Intent] {
        &self.intents
    }

    /// Check if a structure will stand on `cell` once this plan lands.
    #[must_use]
    pub fn has_structure(&self, board: &impl BoardQuery, cell: Cell) -> bool {
        self.placed.contains_key(&cell) || board.has_stationary_unit(cell)
    }

    /// Flag one of our structures for removal.
    ///
    /// Returns false if there is nothing of ours to remove.
    pub fn remove(&mut self, board: &impl BoardQuery, cell: Cell) -> bool {
        let ours = board
            .stationary_unit_at(cell)
            .is_some_and(|unit| unit.owner == Player::Friendly);
        if !ours || !board.arena().is_friendly_territory(cell) || !self.removed.insert(cell) {
            return false;
        }
        self.intents.push(Intent::Remove(cell));
        true
    }

    /// How many units of `unit_type` this plan could still afford.
    #[must_use]
    pub fn affordable(&self, board: &impl BoardQuery, unit_type: UnitType) -> u32 {
        let stats = board.unit_stats(unit_type);
        [ResourcePool::Structure, ResourcePool::Mobility]
            .into_iter()
            .filter_map(|pool| {
                let cost = stats.cost(pool);
                (cost > Fixed::ZERO).then(|| (self.budget(pool) / cost).floor())
            })
            .map(|n| n.to_num::<u32>())
            .min()
            .unwrap_or(u32::MAX)
    }

    /// Check if one unit could be placed on `cell` given earlier requests.
    #[must_use]
    pub fn can_spawn(&self, board: &impl BoardQuery, unit_type: UnitType, cell: Cell) -> bool {
        if !board.can_place(unit_type, cell) || self.placed.contains_key(&cell) {
            return false;
        }
        if unit_type.is_stationary() && self.deployed.contains(&cell) {
            return false;
        }
        self.affordable(board, unit_type) > 0
    }

    /// Spawn up to `requested` units, clamped to what is affordable.
    ///
    /// Structures are capped at one per cell. Returns the count accepted.
    pub fn spawn(
        &mut self,
        board: &impl BoardQuery,
        unit_type: UnitType,
        cell: Cell,
        requested: u32,
    ) -> u32 {
        if requested == 0 || !self.can_spawn(board, unit_type, cell) {
            return 0;
        }
        let cap = if unit_type.is_stationary() { 1 } else { requested };
        let count = cap.min(self.affordable(board, unit_type));

        let stats = board.unit_stats(unit_type);
        for pool in [ResourcePool::Structure, ResourcePool::Mobility] {
            *self.budget_mut(pool) -= stats.cost(pool) * Fixed::from_num(count);
        }

        if unit_type.is_stationary() {
            self.placed.insert(cell, unit_type);
        } else {
            self.deployed.insert(cell);
        }
        trace!(%unit_type, %cell, count, "Spawn accepted");
        self.intents.push(Intent::Spawn {
            unit_type,
            cell,
            count,
        });
        count
    }

    /// Spawn one structure on each cell in order, skipping refusals.
    ///
    /// Returns how many were placed.
    pub fn spawn_each(
        &mut self,
        board: &impl BoardQuery,
        unit_type: UnitType,
        cells: &[Cell],
    ) -> u32 {
        cells
            .iter()
            .map(|&cell| self.spawn(board, unit_type, cell, 1))
            .sum()
    }

    /// Upgrade the structure on `cell`, whether it already stands or was
    /// placed by this plan.
    ///
    /// Returns false if there is nothing upgradable, the structure is
    /// already flagged for removal, or it is unaffordable.
    pub fn upgrade(&mut self, board: &impl BoardQuery, cell: Cell) -> bool {
        if self.upgraded.contains(&cell) || self.removed.contains(&cell) {
            return false;
        }
        let unit_type = match (self.placed.get(&cell), board.stationary_unit_at(cell)) {
            (Some(&placed), _) => placed,
            (None, Some(unit))
                if unit.owner == Player::Friendly && !unit.upgraded && !unit.pending_removal =>
            {
                unit.unit_type
            }
            _ => return false,
        };

        let stats = board.unit_stats(unit_type);
        let mut costs = Vec::with_capacity(2);
        for pool in [ResourcePool::Structure, ResourcePool::Mobility] {
            let Some(cost) = stats.upgrade_cost(pool) else {
                return false;
            };
            if cost > self.budget(pool) {
                return false;
            }
            costs.push((pool, cost));
        }
        for (pool, cost) in costs {
            *self.budget_mut(pool) -= cost;
        }

        self.upgraded.insert(cell);
        self.intents.push(Intent::Upgrade(cell));
        true
    }

    /// Upgrade each cell in order, skipping refusals.
    pub fn upgrade_each(&mut self, board: &impl BoardQuery, cells: &[Cell]) -> u32 {
        cells
            .iter()
            .map(|&cell| u32::from(self.upgrade(board, cell)))
            .sum()
    }

    /// Finish the plan: removals, then spawns, then upgrades, each phase in
    /// request order.
    #[must_use]
    pub fn into_intents(self) -> Vec<Intent> {
        let mut intents = self.intents;
        intents.sort_by_key(Intent::phase);
        intents
    }
}

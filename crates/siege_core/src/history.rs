//! Breach history: where and when each player's units crossed an edge.

use serde::{Deserialize, Serialize};

use crate::grid::Cell;
use crate::units::Player;

/// One edge crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreachRecord {
    /// Cell where the unit left the arena.
    pub cell: Cell,
    /// Turn the crossing happened on.
    pub turn: u32,
    /// True if an enemy unit scored against us.
    pub caused_by_enemy: bool,
}

impl BreachRecord {
    /// Player whose unit scored.
    #[must_use]
    pub const fn scorer(&self) -> Player {
        if self.caused_by_enemy {
            Player::Enemy
        } else {
            Player::Friendly
        }
    }
}

/// Append-only log of breaches, in the order they were observed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreachHistory {
    records: Vec<BreachRecord>,
}

impl BreachHistory {
    /// Create an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a crossing by `scorer`'s unit.
    pub fn record(&mut self, cell: Cell, turn: u32, scorer: Player) {
        self.records.push(BreachRecord {
            cell,
            turn,
            caused_by_enemy: scorer == Player::Enemy,
        });
    }

    /// All records, oldest first.
    #[must_use]
    pub fn records(&self) -> &[BreachRecord] {
        &self.records
    }

    /// Crossings by `scorer` on or after `since_turn`.
    pub fn recent_breaches(
        &self,
        scorer: Player,
        since_turn: u32,
    ) -> impl Iterator<Item = &BreachRecord> + '_ {
        self.records
            .iter()
            .filter(move |r| r.scorer() == scorer && r.turn >= since_turn)
    }

    /// Most recent crossing by `scorer`.
    #[must_use]
    pub fn last_scored_by(&self, scorer: Player) -> Option<&BreachRecord> {
        self.records.iter().rev().find(|r| r.scorer() == scorer)
    }

    /// Distinct cells the enemy has scored on, first sighting first.
    #[must_use]
    pub fn scored_on_locations(&self) -> Vec<Cell> {
        let mut cells: Vec<Cell> = Vec::new();
        for record in self.records.iter().filter(|r| r.caused_by_enemy) {
            if !cells.contains(&record.cell) {
                cells.push(record.cell);
            }
        }
        cells
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> BreachHistory {
        let mut history = BreachHistory::new();
        history.record(Cell::new(3, 10), 2, Player::Enemy);
        history.record(Cell::new(20, 21), 4, Player::Friendly);
        history.record(Cell::new(3, 10), 5, Player::Enemy);
        history.record(Cell::new(24, 10), 6, Player::Enemy);
        history.record(Cell::new(6, 20), 7, Player::Friendly);
        history
    }

    #[test]
    fn test_recent_breaches_filters_player_and_turn() {
        let history = sample();
        let recent: Vec<_> = history.recent_breaches(Player::Enemy, 5).collect();
        assert_eq!(recent.len(), 2);
        assert!(recent.iter().all(|r| r.caused_by_enemy && r.turn >= 5));

        assert_eq!(history.recent_breaches(Player::Friendly, 0).count(), 2);
        assert_eq!(history.recent_breaches(Player::Friendly, 8).count(), 0);
    }

    #[test]
    fn test_last_scored_by() {
        let history = sample();
        assert_eq!(
            history.last_scored_by(Player::Friendly).map(|r| r.cell),
            Some(Cell::new(6, 20))
        );
        assert_eq!(
            history.last_scored_by(Player::Enemy).map(|r| r.turn),
            Some(6)
        );
        assert!(BreachHistory::new().last_scored_by(Player::Enemy).is_none());
    }

    #[test]
    fn test_scored_on_locations_dedups() {
        let history = sample();
        assert_eq!(
            history.scored_on_locations(),
            vec![Cell::new(3, 10), Cell::new(24, 10)]
        );
        assert_eq!(history.len(), 5);
    }
}

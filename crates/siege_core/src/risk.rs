//! Spawn-location risk model.
//!
//! Every candidate deployment cell is scored by walking the path a mobile
//! unit would take from it and measuring four factors along the way. The
//! factors are combined with a per-unit [`WeightProfile`]; the lowest
//! composite score is the least risky cell.
//!
//! All arithmetic is fixed-point, so identical boards rank candidates
//! identically.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::board::BoardQuery;
use crate::error::{Result, SiegeError};
use crate::grid::Cell;
use crate::math::{decimal_serde, hundredths, Fixed};
use crate::units::{MobileUnit, Player, UnitType};

/// Signed weights for the four path factors.
///
/// A negative weight rewards the factor instead of penalizing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightProfile {
    /// Weight on expected damage taken along the path.
    #[serde(with = "decimal_serde")]
    pub damage: Fixed,
    /// Weight on the number of cells walked.
    #[serde(with = "decimal_serde")]
    pub path_length: Fixed,
    /// Weight on enemy walls orthogonally adjacent to the path.
    #[serde(with = "decimal_serde")]
    pub enemy_wall_adjacency: Fixed,
    /// Weight on friendly supports within shield range of the path.
    #[serde(with = "decimal_serde")]
    pub friendly_support_coverage: Fixed,
}

impl WeightProfile {
    /// Build a profile from weights given in hundredths.
    #[must_use]
    pub fn from_hundredths(damage: i32, path_length: i32, walls: i32, supports: i32) -> Self {
        Self {
            damage: hundredths(damage),
            path_length: hundredths(path_length),
            enemy_wall_adjacency: hundredths(walls),
            friendly_support_coverage: hundredths(supports),
        }
    }

    /// Weighted sum of the factors.
    #[must_use]
    pub fn score(&self, factors: &PathFactors) -> Fixed {
        self.damage * factors.damage
            + self.path_length * Fixed::from_num(factors.path_length)
            + self.enemy_wall_adjacency * Fixed::from_num(factors.enemy_wall_adjacency)
            + self.friendly_support_coverage * Fixed::from_num(factors.friendly_support_coverage)
    }
}

/// One weight profile per mobile unit kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightProfiles {
    /// Scouts want short, quiet paths.
    pub scout: WeightProfile,
    /// Demolishers want walls nearby to chew on.
    pub demolisher: WeightProfile,
    /// Interceptors mostly care about damage.
    pub interceptor: WeightProfile,
}

impl WeightProfiles {
    /// Profile for a mobile unit kind.
    #[must_use]
    pub const fn get(&self, unit: MobileUnit) -> &WeightProfile {
        match unit {
            MobileUnit::Scout => &self.scout,
            MobileUnit::Demolisher => &self.demolisher,
            MobileUnit::Interceptor => &self.interceptor,
        }
    }
}

impl Default for WeightProfiles {
    fn default() -> Self {
        Self {
            scout: WeightProfile::from_hundredths(50, 35, 20, -20),
            demolisher: WeightProfile::from_hundredths(60, 20, -60, -25),
            interceptor: WeightProfile::from_hundredths(40, 10, 20, -10),
        }
    }
}

/// Raw measurements taken along one path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PathFactors {
    /// Sum of per-hit damage from every attacker covering each path cell.
    pub damage: Fixed,
    /// Number of cells in the path, start included.
    pub path_length: u32,
    /// Enemy walls orthogonally adjacent to path cells, counted per cell.
    pub enemy_wall_adjacency: u32,
    /// Friendly supports in range of path cells, counted per cell.
    pub friendly_support_coverage: u32,
}

impl PathFactors {
    /// Measure a path for a friendly walker.
    #[must_use]
    pub fn measure(path: &[Cell], board: &impl BoardQuery, support_radius: Fixed) -> Self {
        let supports = friendly_supports(board);
        let radius_sq = support_radius * support_radius;

        let mut factors = Self {
            path_length: count(path.len()),
            ..Self::default()
        };

        for &cell in path {
            for attacker in board.attackers_of(cell, Player::Friendly) {
                factors.damage += board
                    .unit_stats(attacker.unit_type)
                    .damage_to_mobile(attacker.upgraded);
            }

            factors.enemy_wall_adjacency += count(
                cell.neighbors()
                    .into_iter()
                    .filter(|&n| board.in_bounds(n))
                    .filter(|&n| {
                        board.stationary_unit_at(n).is_some_and(|unit| {
                            unit.owner == Player::Enemy && unit.unit_type == UnitType::Wall
                        })
                    })
                    .count(),
            );

            factors.friendly_support_coverage += count(
                supports
                    .iter()
                    .filter(|support| Fixed::from_num(support.distance_squared(cell)) <= radius_sq)
                    .count(),
            );
        }

        factors
    }
}

fn count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

fn friendly_supports(board: &impl BoardQuery) -> Vec<Cell> {
    let arena = board.arena();
    (0..arena.size())
        .flat_map(|y| (0..arena.size()).map(move |x| Cell::new(x, y)))
        .filter(|&cell| {
            board.stationary_unit_at(cell).is_some_and(|unit| {
                unit.owner == Player::Friendly && unit.unit_type == UnitType::Support
            })
        })
        .collect()
}

/// Score breakdown for one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateScore {
    /// Candidate spawn cell.
    pub cell: Cell,
    /// Measurements along its path.
    pub factors: PathFactors,
    /// Weighted composite; lower is safer.
    pub score: Fixed,
}

/// Scores candidate spawn cells for mobile units.
///
/// # Example
///
/// ```
/// use siege_core::board::GameState;
/// use siege_core::data::GameConfig;
/// use siege_core::grid::Cell;
/// use siege_core::risk::RiskModel;
/// use siege_core::units::MobileUnit;
///
/// let board = GameState::new(GameConfig::default(), 0);
/// let model = RiskModel::default();
/// let candidates = [Cell::new(13, 0), Cell::new(14, 0)];
///
/// let choice = model
///     .select_spawn_location(&candidates, MobileUnit::Scout, &board)
///     .unwrap();
/// assert!(candidates.contains(&choice));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiskModel {
    weights: WeightProfiles,
    support_radius: Fixed,
}

impl RiskModel {
    /// Default shield radius used to count support coverage.
    #[must_use]
    pub fn default_support_radius() -> Fixed {
        hundredths(350)
    }

    /// Create a model with explicit weights and support radius.
    #[must_use]
    pub const fn new(weights: WeightProfiles, support_radius: Fixed) -> Self {
        Self {
            weights,
            support_radius,
        }
    }

    /// Weight tables in use.
    #[must_use]
    pub const fn weights(&self) -> &WeightProfiles {
        &self.weights
    }

    /// Score every candidate that has a path, in input order.
    ///
    /// Candidates whose path is unavailable are logged and left out.
    ///
    /// # Errors
    ///
    /// Returns `SiegeError::IllegalCandidate` for a candidate the board
    /// would refuse to spawn `unit` on.
    pub fn score_candidates(
        &self,
        candidates: &[Cell],
        unit: MobileUnit,
        board: &impl BoardQuery,
    ) -> Result<Vec<CandidateScore>> {
        let profile = self.weights.get(unit);
        let mut scores = Vec::with_capacity(candidates.len());

        for &cell in candidates {
            if !board.is_legal_spawn(unit.into(), cell) {
                return Err(SiegeError::IllegalCandidate(cell));
            }
            let Some(path) = board.path_to_edge(cell) else {
                debug!("{}", SiegeError::PathUnavailable(cell));
                continue;
            };
            let factors = PathFactors::measure(&path, board, self.support_radius);
            let score = profile.score(&factors);
            debug!(
                %unit,
                %cell,
                damage = %factors.damage,
                length = factors.path_length,
                walls = factors.enemy_wall_adjacency,
                supports = factors.friendly_support_coverage,
                %score,
                "Scored spawn candidate"
            );
            scores.push(CandidateScore {
                cell,
                factors,
                score,
            });
        }

        Ok(scores)
    }

    /// Pick the least risky candidate. Ties keep the earliest candidate.
    ///
    /// # Errors
    ///
    /// Returns `SiegeError::EmptyCandidateSet` if there are no candidates or
    /// none has a path, and `SiegeError::IllegalCandidate` as
    /// [`RiskModel::score_candidates`] does.
    pub fn select_spawn_location(
        &self,
        candidates: &[Cell],
        unit: MobileUnit,
        board: &impl BoardQuery,
    ) -> Result<Cell> {
        if candidates.is_empty() {
            return Err(SiegeError::EmptyCandidateSet);
        }

        let scores = self.score_candidates(candidates, unit, board)?;
        lowest_score(&scores)
            .map(|best| best.cell)
            .ok_or(SiegeError::EmptyCandidateSet)
    }
}

/// First candidate with the strictly lowest score.
#[must_use]
pub fn lowest_score(scores: &[CandidateScore]) -> Option<&CandidateScore> {
    let mut best: Option<&CandidateScore> = None;
    for candidate in scores {
        if best.map_or(true, |b| candidate.score < b.score) {
            best = Some(candidate);
        }
    }
    best
}

impl Default for RiskModel {
    fn default() -> Self {
        Self::new(WeightProfiles::default(), Self::default_support_radius())
    }
}

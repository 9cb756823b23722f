//! Offensive-readiness state machine.
//!
//! The offense cycles through three states:
//!
//! ```text
//! Idle ──ready──▶ BreachRequested ──breach clear──▶ BreachCleared ──wave──▶ Idle
//! ```
//!
//! Opening a breach means removing our own structures on one flank. The
//! engine applies removals at the end of the turn, so the wave only goes out
//! once a later snapshot shows every breach cell empty.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::board::BoardQuery;
use crate::data::{FlankPlan, FlankPolicy, StrategyConfig};
use crate::error::{Result, SiegeError};
use crate::grid::{Cell, Flank};
use crate::history::BreachHistory;
use crate::intents::TurnPlan;
use crate::risk::RiskModel;
use crate::strength::{choose_weaker_side, flank_is_crowded};
use crate::units::{MobileUnit, Player, ResourcePool, UnitType};

/// Where the offense is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OffensiveState {
    /// Waiting for enough mobility.
    #[default]
    Idle,
    /// Breach removals issued; waiting for the cells to empty.
    BreachRequested,
    /// Breach open; the wave goes out this turn.
    BreachCleared,
}

impl OffensiveState {
    /// The only state this one may move to.
    #[must_use]
    pub const fn successor(self) -> Self {
        match self {
            Self::Idle => Self::BreachRequested,
            Self::BreachRequested => Self::BreachCleared,
            Self::BreachCleared => Self::Idle,
        }
    }
}

impl fmt::Display for OffensiveState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::BreachRequested => f.write_str("breach-requested"),
            Self::BreachCleared => f.write_str("breach-cleared"),
        }
    }
}

/// A single state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    /// State before.
    pub from: OffensiveState,
    /// State after.
    pub to: OffensiveState,
}

impl Transition {
    /// Check this is one step along the cycle.
    #[must_use]
    pub const fn is_legal(&self) -> bool {
        matches!(
            (self.from, self.to),
            (OffensiveState::Idle, OffensiveState::BreachRequested)
                | (OffensiveState::BreachRequested, OffensiveState::BreachCleared)
                | (OffensiveState::BreachCleared, OffensiveState::Idle)
        )
    }
}

/// Lane we are opening in our own defenses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChosenBreach {
    /// Flank the lane is on.
    pub flank: Flank,
    /// Our cells being cleared.
    pub cells: Vec<Cell>,
}

/// Units sent by one wave.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WaveReport {
    /// `(unit, cell, count)` per accepted spawn, in order.
    pub spawns: Vec<(MobileUnit, Cell, u32)>,
    /// True if the front line called for demolishers.
    pub demolishers: bool,
    /// True if the flank's enemy pattern showed and a vanguard went first.
    pub vanguard: bool,
}

impl WaveReport {
    /// Total units deployed.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.spawns.iter().map(|(_, _, count)| count).sum()
    }
}

/// What the offense did this turn.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OffenseOutcome {
    /// Transitions taken, in order.
    pub transitions: Vec<Transition>,
    /// The wave, if one was launched.
    pub wave: Option<WaveReport>,
}

/// Cross-turn offense state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offense {
    state: OffensiveState,
    breach: Option<ChosenBreach>,
}

impl Offense {
    /// Current state.
    #[must_use]
    pub const fn state(&self) -> OffensiveState {
        self.state
    }

    /// Chosen breach cells; empty while idle.
    #[must_use]
    pub fn chosen_breach(&self) -> &[Cell] {
        self.breach.as_ref().map_or(&[], |b| b.cells.as_slice())
    }

    /// Flank being breached, if any.
    #[must_use]
    pub fn chosen_flank(&self) -> Option<Flank> {
        self.breach.as_ref().map(|b| b.flank)
    }

    /// Check the breach is set exactly when the offense is active.
    ///
    /// # Errors
    ///
    /// Returns `SiegeError::InvariantViolation` describing the mismatch.
    pub fn validate(&self) -> Result<()> {
        let idle = self.state == OffensiveState::Idle;
        let has_breach = !self.chosen_breach().is_empty();
        if idle == has_breach {
            return Err(SiegeError::InvariantViolation(format!(
                "offense is {} but chosen breach has {} cells",
                self.state,
                self.chosen_breach().len()
            )));
        }
        Ok(())
    }

    /// Drop any in-flight breach and return to idle.
    pub fn reset(&mut self) {
        self.state = OffensiveState::Idle;
        self.breach = None;
    }

    /// Run the state machine for one turn.
    ///
    /// # Errors
    ///
    /// Returns `SiegeError::InvariantViolation` if the stored state is
    /// inconsistent, leaving it untouched so the caller can decide.
    pub fn advance(
        &mut self,
        board: &impl BoardQuery,
        strategy: &StrategyConfig,
        history: &BreachHistory,
        plan: &mut TurnPlan,
    ) -> Result<OffenseOutcome> {
        self.validate()?;
        let mut outcome = OffenseOutcome::default();

        loop {
            match self.state {
                OffensiveState::Idle => {
                    if self.open_breach(board, strategy, history, plan) {
                        self.transition(OffensiveState::BreachRequested, &mut outcome);
                    }
                    break;
                }
                OffensiveState::BreachRequested => {
                    let blocked = self
                        .chosen_breach()
                        .iter()
                        .any(|&cell| board.has_stationary_unit(cell));
                    if blocked {
                        debug!(breach = ?self.chosen_breach(), "Breach not clear yet");
                        break;
                    }
                    self.transition(OffensiveState::BreachCleared, &mut outcome);
                }
                OffensiveState::BreachCleared => {
                    let flank = self.chosen_flank().unwrap_or(Flank::Right);
                    let wave = deploy_wave(strategy.flank(flank), board, strategy, plan)?;
                    info!(%flank, units = wave.total(), demolishers = wave.demolishers, "Wave launched");
                    outcome.wave = Some(wave);
                    self.breach = None;
                    self.transition(OffensiveState::Idle, &mut outcome);
                    break;
                }
            }
        }

        Ok(outcome)
    }

    fn transition(&mut self, to: OffensiveState, outcome: &mut OffenseOutcome) {
        let step = Transition {
            from: self.state,
            to,
        };
        debug_assert!(step.is_legal());
        info!(from = %step.from, to = %step.to, "Offense transition");
        self.state = to;
        outcome.transitions.push(step);
    }

    fn open_breach(
        &mut self,
        board: &impl BoardQuery,
        strategy: &StrategyConfig,
        history: &BreachHistory,
        plan: &mut TurnPlan,
    ) -> bool {
        let projected = board.projected_resource(ResourcePool::Mobility, 1, Player::Friendly);
        let enemy_health = board.health(Player::Enemy);
        if !strategy.readiness.is_ready(projected, enemy_health) {
            debug!(
                %projected,
                threshold = %strategy.readiness.threshold(enemy_health),
                "Offense not ready"
            );
            return false;
        }

        let flank = choose_flank(board, strategy, history);
        let cells = strategy.flank(flank).breach.clone();
        for &cell in &cells {
            plan.remove(board, cell);
        }
        info!(%flank, breach = ?cells, "Opening breach");
        self.breach = Some(ChosenBreach { flank, cells });
        true
    }
}

/// Pick the flank to breach under the configured policy.
#[must_use]
pub fn choose_flank(
    board: &impl BoardQuery,
    strategy: &StrategyConfig,
    history: &BreachHistory,
) -> Flank {
    let weaker = || {
        choose_weaker_side(
            &strategy.left.enemy_triangle,
            &strategy.right.enemy_triangle,
            board,
        )
    };

    match strategy.flank_policy {
        FlankPolicy::WeakerSide => weaker(),
        FlankPolicy::BreachHistory => {
            let since = board.turn_number().saturating_sub(1);
            let arena = board.arena();
            if let Some(recent) = history.recent_breaches(Player::Friendly, since).last() {
                arena.flank_of(recent.cell)
            } else if let Some(older) = history.last_scored_by(Player::Friendly) {
                arena.flank_of(older.cell).opposite()
            } else {
                weaker()
            }
        }
    }
}

/// Count enemy structures standing on the configured front rows.
#[must_use]
pub fn front_line_count(board: &impl BoardQuery, rows: &[i32]) -> u32 {
    let size = board.arena().size();
    let count = rows
        .iter()
        .flat_map(|&y| (0..size).map(move |x| Cell::new(x, y)))
        .filter_map(|cell| board.stationary_unit_at(cell))
        .filter(|unit| unit.owner == Player::Enemy)
        .count();
    u32::try_from(count).unwrap_or(u32::MAX)
}

/// Send the wave through `flank`'s breach.
///
/// If the flank's enemy pattern shows, a small demolisher vanguard goes
/// first and the rest of the mobility buys scouts. Otherwise interceptors
/// escort when required supports are missing, and the main body is
/// demolishers when the front line is full or the flank is crowded.
///
/// # Errors
///
/// Propagates risk-model errors other than an empty candidate set, which
/// only skips that unit kind.
pub fn deploy_wave(
    flank: &FlankPlan,
    board: &impl BoardQuery,
    strategy: &StrategyConfig,
    plan: &mut TurnPlan,
) -> Result<WaveReport> {
    let model = strategy.risk_model();
    let wave = &strategy.wave;
    let mut report = WaveReport::default();

    if flank.enemy_pattern.as_ref().is_some_and(|pattern| pattern.matches(board)) {
        debug!(flank = %flank.flank, "Enemy pattern seen, sending vanguard");
        report.vanguard = true;
        send(&model, MobileUnit::Demolisher, wave.pattern_vanguard, board, plan, &mut report)?;
        send(&model, MobileUnit::Scout, u32::MAX, board, plan, &mut report)?;
        return Ok(report);
    }

    let supported = flank.required_supports.iter().all(|&cell| {
        board
            .stationary_unit_at(cell)
            .is_some_and(|unit| unit.is_structure_of(Player::Friendly) && unit.unit_type == UnitType::Support)
    });
    if !supported {
        send(&model, MobileUnit::Interceptor, wave.interceptor_escort, board, plan, &mut report)?;
    }

    let front = front_line_count(board, &wave.front_rows);
    let crowded = flank_is_crowded(&flank.enemy_triangle, board, wave.crowded_limit);
    report.demolishers = front >= wave.front_line_threshold || crowded;
    debug!(front, crowded, "Assessed enemy front line");

    let main = if report.demolishers {
        MobileUnit::Demolisher
    } else {
        MobileUnit::Scout
    };
    send(&model, main, u32::MAX, board, plan, &mut report)?;

    Ok(report)
}

fn send(
    model: &RiskModel,
    unit: MobileUnit,
    requested: u32,
    board: &impl BoardQuery,
    plan: &mut TurnPlan,
    report: &mut WaveReport,
) -> Result<()> {
    let unit_type = UnitType::from(unit);
    if requested == 0 || plan.affordable(board, unit_type) == 0 {
        return Ok(());
    }

    let candidates: Vec<Cell> = board
        .arena()
        .deployment_cells()
        .into_iter()
        .filter(|&cell| board.is_legal_spawn(unit_type, cell) && plan.can_spawn(board, unit_type, cell))
        .collect();

    let cell = match model.select_spawn_location(&candidates, unit, board) {
        Ok(cell) => cell,
        Err(SiegeError::EmptyCandidateSet) => {
            warn!(%unit, "No deploy cell has a path");
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    let count = plan.spawn(board, unit_type, cell, requested);
    if count > 0 {
        report.spawns.push((unit, cell, count));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{GameState, PlayerStats};
    use crate::data::{GameConfig, ReadinessPolicy};
    use crate::math::Fixed;

    fn board(turn: u32, mobility: i32) -> GameState {
        let mut state = GameState::new(GameConfig::default(), turn);
        state.set_player_stats(
            Player::Friendly,
            PlayerStats {
                health: Fixed::from_num(30),
                structure_points: Fixed::from_num(10),
                mobility_points: Fixed::from_num(mobility),
            },
        );
        state.set_player_stats(
            Player::Enemy,
            PlayerStats {
                health: Fixed::from_num(30),
                ..PlayerStats::default()
            },
        );
        state
    }

    fn flat(threshold: i32) -> StrategyConfig {
        StrategyConfig {
            readiness: ReadinessPolicy::Flat {
                threshold: Fixed::from_num(threshold),
            },
            ..StrategyConfig::default()
        }
    }

    fn run(offense: &mut Offense, state: &GameState, strategy: &StrategyConfig) -> (OffenseOutcome, TurnPlan) {
        let mut plan = TurnPlan::new(state);
        let outcome = offense
            .advance(state, strategy, &BreachHistory::new(), &mut plan)
            .unwrap();
        (outcome, plan)
    }

    #[test]
    fn test_stays_idle_when_poor() {
        let mut offense = Offense::default();
        // 0 * 0.75 + 5 = 5 projected.
        let (outcome, plan) = run(&mut offense, &board(1, 0), &flat(14));
        assert!(outcome.transitions.is_empty());
        assert_eq!(offense.state(), OffensiveState::Idle);
        assert!(plan.intents().is_empty());
        offense.validate().unwrap();
    }

    #[test]
    fn test_full_cycle() {
        let strategy = flat(14);
        let mut offense = Offense::default();

        // Turn 1: our turret blocks the right breach cell.
        let mut first = board(1, 12);
        first
            .place(UnitType::Turret, Player::Friendly, Cell::new(26, 13))
            .unwrap();
        let (outcome, plan) = run(&mut offense, &first, &strategy);
        assert_eq!(
            outcome.transitions,
            vec![Transition {
                from: OffensiveState::Idle,
                to: OffensiveState::BreachRequested
            }]
        );
        assert_eq!(offense.chosen_flank(), Some(Flank::Right));
        assert_eq!(offense.chosen_breach(), &[Cell::new(26, 13)]);
        assert_eq!(plan.intents().len(), 1);

        // Turn 2: the turret is still there.
        let (outcome, _) = run(&mut offense, &first, &strategy);
        assert!(outcome.transitions.is_empty());
        assert_eq!(offense.state(), OffensiveState::BreachRequested);

        // Turn 3: removal landed; chain straight through to the wave.
        let cleared = board(3, 14);
        let (outcome, plan) = run(&mut offense, &cleared, &strategy);
        assert_eq!(outcome.transitions.len(), 2);
        assert!(outcome.transitions.iter().all(Transition::is_legal));
        let wave = outcome.wave.unwrap();
        assert!(!wave.demolishers);
        // Supports missing: 5 interceptors, then 9 scouts.
        assert_eq!(wave.spawns[0].0, MobileUnit::Interceptor);
        assert_eq!(wave.spawns[0].2, 5);
        assert_eq!(wave.total(), 14);
        assert_eq!(plan.budget(ResourcePool::Mobility), Fixed::ZERO);
        assert_eq!(offense.state(), OffensiveState::Idle);
        assert!(offense.chosen_breach().is_empty());
    }

    #[test]
    fn test_supported_flank_skips_escort() {
        let strategy = flat(14);
        let mut offense = Offense {
            state: OffensiveState::BreachRequested,
            breach: Some(ChosenBreach {
                flank: Flank::Left,
                cells: strategy.left.breach.clone(),
            }),
        };
        let mut state = board(6, 6);
        for &cell in &strategy.left.required_supports {
            state.place(UnitType::Support, Player::Friendly, cell).unwrap();
        }

        let (outcome, _) = run(&mut offense, &state, &strategy);
        let wave = outcome.wave.unwrap();
        assert_eq!(wave.spawns.len(), 1);
        assert_eq!(wave.spawns[0].0, MobileUnit::Scout);
        assert_eq!(wave.spawns[0].2, 6);
    }

    #[test]
    fn test_crowded_flank_sends_demolishers() {
        let strategy = flat(14);
        let mut offense = Offense {
            state: OffensiveState::BreachCleared,
            breach: Some(ChosenBreach {
                flank: Flank::Left,
                cells: strategy.left.breach.clone(),
            }),
        };
        let mut state = board(6, 9);
        for &cell in &strategy.left.required_supports {
            state.place(UnitType::Support, Player::Friendly, cell).unwrap();
        }
        for &cell in &strategy.left.enemy_triangle[..5] {
            state.place(UnitType::Wall, Player::Enemy, cell).unwrap();
        }

        let (outcome, _) = run(&mut offense, &state, &strategy);
        let wave = outcome.wave.unwrap();
        assert!(wave.demolishers);
        assert_eq!(wave.spawns, vec![(MobileUnit::Demolisher, wave.spawns[0].1, 3)]);
    }

    fn cleared_left(strategy: &StrategyConfig) -> Offense {
        Offense {
            state: OffensiveState::BreachCleared,
            breach: Some(ChosenBreach {
                flank: Flank::Left,
                cells: strategy.left.breach.clone(),
            }),
        }
    }

    fn supported_board(strategy: &StrategyConfig, mobility: i32) -> GameState {
        let mut state = board(6, mobility);
        for &cell in &strategy.left.required_supports {
            state.place(UnitType::Support, Player::Friendly, cell).unwrap();
        }
        state
    }

    #[test]
    fn test_full_front_line_sends_demolishers() {
        let strategy = flat(14);
        let mut offense = cleared_left(&strategy);
        let mut state = supported_board(&strategy, 9);
        for x in 8..19 {
            state.place(UnitType::Wall, Player::Enemy, Cell::new(x, 14)).unwrap();
        }
        assert_eq!(front_line_count(&state, &strategy.wave.front_rows), 11);

        let (outcome, _) = run(&mut offense, &state, &strategy);
        let wave = outcome.wave.unwrap();
        assert!(wave.demolishers);
        assert!(!wave.vanguard);
        assert_eq!(wave.spawns, vec![(MobileUnit::Demolisher, wave.spawns[0].1, 3)]);
    }

    #[test]
    fn test_front_line_below_threshold_sends_scouts() {
        let strategy = flat(14);
        let mut offense = cleared_left(&strategy);
        let mut state = supported_board(&strategy, 9);
        for x in 8..18 {
            state.place(UnitType::Wall, Player::Enemy, Cell::new(x, 14)).unwrap();
        }

        let (outcome, _) = run(&mut offense, &state, &strategy);
        let wave = outcome.wave.unwrap();
        assert!(!wave.demolishers);
        assert_eq!(wave.spawns, vec![(MobileUnit::Scout, wave.spawns[0].1, 9)]);
    }

    #[test]
    fn test_enemy_pattern_sends_vanguard_then_scouts() {
        let strategy = flat(14);
        let mut offense = cleared_left(&strategy);
        let mut state = supported_board(&strategy, 12);
        let Some(pattern) = strategy.left.enemy_pattern.clone() else {
            panic!("stock left flank has a pattern");
        };
        for &cell in &pattern.walls {
            state.place(UnitType::Wall, Player::Enemy, cell).unwrap();
        }

        let (outcome, _) = run(&mut offense, &state, &strategy);
        let wave = outcome.wave.unwrap();
        assert!(wave.vanguard);
        assert_eq!(wave.spawns.len(), 2);
        assert_eq!(wave.spawns[0].0, MobileUnit::Demolisher);
        assert_eq!(wave.spawns[0].2, strategy.wave.pattern_vanguard);
        // 12 mobility less two demolishers at 3 each.
        assert_eq!(wave.spawns[1].0, MobileUnit::Scout);
        assert_eq!(wave.spawns[1].2, 6);
    }

    #[test]
    fn test_broken_pattern_is_ignored() {
        let strategy = flat(14);
        let mut offense = cleared_left(&strategy);
        let mut state = supported_board(&strategy, 12);
        let Some(pattern) = strategy.left.enemy_pattern.clone() else {
            panic!("stock left flank has a pattern");
        };
        for &cell in &pattern.walls[1..] {
            state.place(UnitType::Wall, Player::Enemy, cell).unwrap();
        }
        assert!(!pattern.matches(&state));
        state.place(UnitType::Wall, Player::Enemy, pattern.walls[0]).unwrap();
        state.place(UnitType::Wall, Player::Enemy, pattern.empty[3]).unwrap();
        assert!(!pattern.matches(&state));

        let (outcome, _) = run(&mut offense, &state, &strategy);
        let wave = outcome.wave.unwrap();
        assert!(!wave.vanguard);
        assert!(wave.spawns.iter().all(|&(unit, _, _)| unit == MobileUnit::Scout));
    }

    #[test]
    fn test_inconsistent_state_is_reported() {
        let mut offense = Offense {
            state: OffensiveState::BreachRequested,
            breach: None,
        };
        let state = board(2, 0);
        let mut plan = TurnPlan::new(&state);
        let result = offense.advance(&state, &flat(14), &BreachHistory::new(), &mut plan);
        assert!(matches!(result, Err(SiegeError::InvariantViolation(_))));

        offense.reset();
        offense.validate().unwrap();
    }

    #[test]
    fn test_breach_history_policy() {
        let strategy = StrategyConfig {
            flank_policy: FlankPolicy::BreachHistory,
            ..flat(14)
        };
        let mut history = BreachHistory::new();
        let state = board(8, 20);

        // No score yet: weaker side, which ties right on an empty board.
        assert_eq!(choose_flank(&state, &strategy, &history), Flank::Right);

        // Scored on the right three turns ago: switch.
        history.record(Cell::new(20, 21), 5, Player::Friendly);
        assert_eq!(choose_flank(&state, &strategy, &history), Flank::Left);

        // Scored on the right last turn: repeat.
        history.record(Cell::new(22, 19), 7, Player::Friendly);
        assert_eq!(choose_flank(&state, &strategy, &history), Flank::Right);

        // Enemy scores are ignored.
        history.record(Cell::new(3, 10), 7, Player::Enemy);
        assert_eq!(choose_flank(&state, &strategy, &history), Flank::Right);
    }

    #[test]
    fn test_front_line_count() {
        let mut state = board(1, 0);
        state
            .place(UnitType::Wall, Player::Enemy, Cell::new(5, 14))
            .unwrap();
        state
            .place(UnitType::Turret, Player::Enemy, Cell::new(6, 15))
            .unwrap();
        state
            .place(UnitType::Turret, Player::Enemy, Cell::new(6, 16))
            .unwrap();
        state
            .place(UnitType::Scout, Player::Enemy, Cell::new(7, 14))
            .unwrap();
        assert_eq!(front_line_count(&state, &[14, 15]), 2);
    }
}

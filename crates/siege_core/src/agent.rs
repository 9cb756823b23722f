//! Turn orchestration.
//!
//! [`play_turn`] is the single entry point the driver calls once per turn.
//! Everything that must survive between turns lives in [`AgentContext`],
//! which the driver owns and passes in explicitly.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::board::BoardQuery;
use crate::data::StrategyConfig;
use crate::defense::{stall_with_interceptors, DefenseBuilder};
use crate::error::SiegeError;
use crate::grid::Cell;
use crate::history::BreachHistory;
use crate::intents::{Intent, TurnPlan};
use crate::offense::{Offense, Transition, WaveReport};
use crate::units::{Player, UnitType};

/// State carried from one turn to the next.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentContext {
    offense: Offense,
    history: BreachHistory,
    opponent_sent_demolisher: bool,
}

impl AgentContext {
    /// Fresh context for a new match.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Offense state machine.
    #[must_use]
    pub fn offense(&self) -> &Offense {
        &self.offense
    }

    /// Breach log.
    #[must_use]
    pub fn history(&self) -> &BreachHistory {
        &self.history
    }

    /// Whether the opponent has deployed a demolisher yet.
    #[must_use]
    pub fn opponent_sent_demolisher(&self) -> bool {
        self.opponent_sent_demolisher
    }

    /// Record a unit leaving the arena through an edge.
    pub fn record_breach(&mut self, cell: Cell, turn: u32, scorer: Player) {
        if scorer == Player::Enemy {
            info!(%cell, turn, "Scored on");
        }
        self.history.record(cell, turn, scorer);
    }

    /// Note a unit spawn seen in an action frame.
    pub fn observe_spawn(&mut self, unit_type: UnitType, owner: Player, turn: u32) {
        if owner == Player::Enemy
            && unit_type == UnitType::Demolisher
            && !self.opponent_sent_demolisher
        {
            info!(turn, "Opponent sent a demolisher");
            self.opponent_sent_demolisher = true;
        }
    }
}

/// Everything decided in one turn.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TurnReport {
    /// Turn number.
    pub turn: u32,
    /// Offense transitions taken.
    pub transitions: Vec<Transition>,
    /// Wave launched, if any.
    pub wave: Option<WaveReport>,
    /// Stall interceptors deployed.
    pub stall_interceptors: u32,
    /// Structures placed.
    pub structures_built: u32,
    /// Supports and upgrades bought with leftover points.
    pub upgrades: u32,
    /// Error that forced the offense back to idle, if any.
    pub degraded: Option<SiegeError>,
    /// Intents to submit, in phase order.
    pub intents: Vec<Intent>,
}

/// Decide one turn.
///
/// Runs the offense, the opening stall, the defense build and the upgrades
/// against a shared [`TurnPlan`]. An offense error never aborts the turn: it
/// is logged, recorded in [`TurnReport::degraded`] and the offense resets.
///
/// # Example
///
/// ```
/// use siege_core::agent::{play_turn, AgentContext};
/// use siege_core::board::GameState;
/// use siege_core::data::{GameConfig, StrategyConfig};
///
/// let board = GameState::new(GameConfig::default(), 0);
/// let mut ctx = AgentContext::new();
/// let report = play_turn(&mut ctx, &board, &StrategyConfig::default());
///
/// assert!(report.degraded.is_none());
/// assert!(report.intents.is_empty());
/// ```
pub fn play_turn(
    ctx: &mut AgentContext,
    board: &impl BoardQuery,
    strategy: &StrategyConfig,
) -> TurnReport {
    let mut report = TurnReport {
        turn: board.turn_number(),
        ..TurnReport::default()
    };
    let mut plan = TurnPlan::new(board);
    let mut keep_clear: Vec<Cell> = ctx.offense.chosen_breach().to_vec();

    match ctx
        .offense
        .advance(board, strategy, &ctx.history, &mut plan)
    {
        Ok(outcome) => {
            report.transitions = outcome.transitions;
            report.wave = outcome.wave;
        }
        Err(err) => {
            warn!(turn = report.turn, error = %err, "Offense degraded, resetting to idle");
            ctx.offense.reset();
            report.degraded = Some(err);
        }
    }
    for &cell in ctx.offense.chosen_breach() {
        if !keep_clear.contains(&cell) {
            keep_clear.push(cell);
        }
    }

    report.stall_interceptors = stall_with_interceptors(
        board,
        &mut plan,
        &strategy.stall,
        ctx.opponent_sent_demolisher,
    );

    let builder = DefenseBuilder::new(&strategy.layout, &keep_clear);
    let scored_on = ctx.history.scored_on_locations();
    report.structures_built = builder.build(board, &mut plan, &scored_on);
    report.upgrades = builder.upgrade(board, &mut plan);

    report.intents = plan.into_intents();
    info!(
        turn = report.turn,
        state = %ctx.offense.state(),
        intents = report.intents.len(),
        "Turn planned"
    );
    report
}

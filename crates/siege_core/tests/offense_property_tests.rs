//! Property tests for the offensive-readiness state machine.
//!
//! Drives the agent through random sequences of mobility levels and
//! blocked or cleared breaches, and checks every turn's transitions.

use proptest::prelude::*;
use siege_core::agent::{play_turn, AgentContext};
use siege_core::board::GameState;
use siege_core::data::StrategyConfig;
use siege_core::math::Fixed;
use siege_core::offense::OffensiveState;
use siege_core::units::{Player, UnitType};
use siege_test_utils::determinism::strategies::arb_mobility;
use siege_test_utils::fixtures::BoardBuilder;

/// One turn of input: our mobility and whether the breach cells are still
/// occupied by our own walls.
fn arb_turn() -> impl Strategy<Value = (Fixed, bool)> {
    (arb_mobility(), any::<bool>())
}

fn snapshot(turn: u32, mobility: Fixed, blocked: bool, strategy: &StrategyConfig) -> GameState {
    let mut builder = BoardBuilder::new().turn(turn).resources(8, 0).mobility(mobility);
    if blocked {
        builder = builder
            .structures(UnitType::Wall, Player::Friendly, &strategy.left.breach)
            .structures(UnitType::Wall, Player::Friendly, &strategy.right.breach);
    }
    builder.build()
}

// =============================================================================
// Transition laws
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn transitions_are_legal_and_chained(turns in proptest::collection::vec(arb_turn(), 1..20)) {
        let strategy = StrategyConfig::default();
        let mut ctx = AgentContext::new();

        for (turn, (mobility, blocked)) in (0u32..).zip(turns) {
            let before = ctx.offense().state();
            let board = snapshot(turn, mobility, blocked, &strategy);
            let report = play_turn(&mut ctx, &board, &strategy);

            prop_assert!(report.degraded.is_none());
            prop_assert!(ctx.offense().validate().is_ok());

            let mut current = before;
            for step in &report.transitions {
                prop_assert!(step.is_legal(), "illegal transition {:?}", step);
                prop_assert_eq!(step.from, current);
                current = step.to;
            }
            prop_assert_eq!(current, ctx.offense().state());
        }
    }

    #[test]
    fn requesting_a_breach_ends_the_turn(turns in proptest::collection::vec(arb_turn(), 1..20)) {
        let strategy = StrategyConfig::default();
        let mut ctx = AgentContext::new();

        for (turn, (mobility, blocked)) in (0u32..).zip(turns) {
            let board = snapshot(turn, mobility, blocked, &strategy);
            let report = play_turn(&mut ctx, &board, &strategy);

            let opened = report
                .transitions
                .iter()
                .position(|t| t.from == OffensiveState::Idle && t.to == OffensiveState::BreachRequested);
            if let Some(index) = opened {
                prop_assert_eq!(index, report.transitions.len() - 1);
            }
            prop_assert!(report.transitions.len() <= 3);
        }
    }

    #[test]
    fn wave_only_after_a_clear_breach(turns in proptest::collection::vec(arb_turn(), 1..20)) {
        let strategy = StrategyConfig::default();
        let mut ctx = AgentContext::new();

        for (turn, (mobility, blocked)) in (0u32..).zip(turns) {
            let board = snapshot(turn, mobility, blocked, &strategy);
            let report = play_turn(&mut ctx, &board, &strategy);

            let launched = report
                .transitions
                .iter()
                .any(|t| t.from == OffensiveState::BreachCleared);
            prop_assert_eq!(launched, report.wave.is_some());
            if blocked {
                prop_assert!(report
                    .transitions
                    .iter()
                    .all(|t| t.to != OffensiveState::BreachCleared));
            }
        }
    }
}

//! Worked scenarios for flank scoring, spawn selection and readiness.
//!
//! Each scenario pins exact inputs and checks the decision the agent makes.

use siege_core::agent::{play_turn, AgentContext};
use siege_core::board::BoardQuery;
use siege_core::data::{ReadinessPolicy, StrategyConfig};
use siege_core::grid::Cell;
use siege_core::history::BreachHistory;
use siege_core::intents::TurnPlan;
use siege_core::offense::{Offense, OffensiveState};
use siege_core::risk::RiskModel;
use siege_core::strength::evaluate_region;
use siege_core::units::{MobileUnit, Player, ResourcePool, UnitType};
use siege_test_utils::fixtures::{fixed, tenths, BoardBuilder, ScriptedBoard};

// =============================================================================
// Flank strength
// =============================================================================

#[test]
fn two_turrets_and_a_wall_score_four_and_a_half() {
    let region = [Cell::new(24, 15), Cell::new(25, 15), Cell::new(26, 14)];
    let board = BoardBuilder::new()
        .structure(UnitType::Turret, Player::Enemy, region[0])
        .structure(UnitType::Turret, Player::Enemy, region[1])
        .structure(UnitType::Wall, Player::Enemy, region[2])
        .build();

    assert_eq!(evaluate_region(&region, &board).structural, tenths(45));
}

// =============================================================================
// Spawn selection
// =============================================================================

/// Two candidates with hand-built paths:
/// - from (13, 0): damage 30, length 10, walls 2, supports 0
/// - from (14, 0): damage 10, length 12, walls 0, supports 1
fn scripted_pair() -> ScriptedBoard {
    let board = BoardBuilder::new()
        .resources(0, 9)
        .stats(UnitType::Turret, |stats| stats.damage_to_mobile = fixed(5))
        .structure(UnitType::Turret, Player::Enemy, Cell::new(10, 20))
        .structure(UnitType::Turret, Player::Enemy, Cell::new(12, 24))
        .structures(
            UnitType::Wall,
            Player::Enemy,
            &[Cell::new(20, 17), Cell::new(22, 17)],
        )
        .structure(UnitType::Support, Player::Friendly, Cell::new(13, 5))
        .build();

    let first_rest = [
        Cell::new(10, 18),
        Cell::new(10, 19),
        Cell::new(10, 21),
        Cell::new(10, 22),
        Cell::new(9, 20),
        Cell::new(11, 20),
        Cell::new(20, 16),
        Cell::new(21, 16),
        Cell::new(22, 16),
    ];
    let mut second_rest = vec![Cell::new(12, 23), Cell::new(12, 22), Cell::new(13, 6)];
    second_rest.extend((17..25).map(|x| Cell::new(x, 10)));

    ScriptedBoard::new(board)
        .with_path(Cell::new(13, 0), &first_rest)
        .with_path(Cell::new(14, 0), &second_rest)
}

#[test]
fn demolisher_prefers_the_quieter_longer_path() {
    let board = scripted_pair();
    let model = RiskModel::default();
    let candidates = [Cell::new(13, 0), Cell::new(14, 0)];

    let scores = model
        .score_candidates(&candidates, MobileUnit::Demolisher, &board)
        .unwrap();
    assert_eq!(scores[0].factors.damage, fixed(30));
    assert_eq!(scores[0].factors.path_length, 10);
    assert_eq!(scores[0].factors.enemy_wall_adjacency, 2);
    assert_eq!(scores[0].factors.friendly_support_coverage, 0);
    assert_eq!(scores[1].factors.damage, fixed(10));
    assert_eq!(scores[1].factors.path_length, 12);
    assert_eq!(scores[1].factors.enemy_wall_adjacency, 0);
    assert_eq!(scores[1].factors.friendly_support_coverage, 1);

    let epsilon = fixed(1) / fixed(100);
    assert!((scores[1].score - tenths(815) / fixed(10)).abs() < epsilon);
    assert!((scores[0].score - tenths(188)).abs() < epsilon);

    assert_eq!(
        model
            .select_spawn_location(&candidates, MobileUnit::Demolisher, &board)
            .unwrap(),
        Cell::new(14, 0)
    );
}

#[test]
fn candidates_without_paths_are_skipped() {
    let board = scripted_pair();
    let model = RiskModel::default();
    // (12, 1) is a legal deploy cell with no scripted path.
    let candidates = [Cell::new(12, 1), Cell::new(13, 0)];

    assert_eq!(
        model
            .select_spawn_location(&candidates, MobileUnit::Scout, &board)
            .unwrap(),
        Cell::new(13, 0)
    );
    assert!(model
        .select_spawn_location(&[Cell::new(12, 1)], MobileUnit::Scout, &board)
        .is_err());
}

// =============================================================================
// Readiness
// =============================================================================

fn flat_fourteen() -> StrategyConfig {
    StrategyConfig {
        readiness: ReadinessPolicy::Flat {
            threshold: fixed(14),
        },
        ..StrategyConfig::default()
    }
}

#[test]
fn flat_threshold_is_inclusive() {
    let policy = flat_fourteen().readiness;
    assert!(policy.is_ready(fixed(14), fixed(30)));
    assert!(!policy.is_ready(tenths(139), fixed(30)));
}

#[test]
fn readiness_uses_next_turn_projection() {
    let strategy = flat_fourteen();

    // 12 * 0.75 + 5 = 14.0 next turn.
    let ready = BoardBuilder::new().resources(0, 12).build();
    assert_eq!(
        ready.projected_resource(ResourcePool::Mobility, 1, Player::Friendly),
        fixed(14)
    );
    let mut offense = Offense::default();
    let mut plan = TurnPlan::new(&ready);
    offense
        .advance(&ready, &strategy, &BreachHistory::new(), &mut plan)
        .unwrap();
    assert_eq!(offense.state(), OffensiveState::BreachRequested);

    // 11.9 * 0.75 + 5 = 13.925, reported as 13.9.
    let short = BoardBuilder::new().mobility(tenths(119)).build();
    let mut offense = Offense::default();
    let mut plan = TurnPlan::new(&short);
    offense
        .advance(&short, &strategy, &BreachHistory::new(), &mut plan)
        .unwrap();
    assert_eq!(offense.state(), OffensiveState::Idle);
}

#[test]
fn low_enemy_health_lowers_the_bar() {
    let strategy = StrategyConfig::default();
    let mut ctx = AgentContext::new();

    // Enemy at 3 health: threshold 3 + 8 = 11; 8 * 0.75 + 5 = 11.
    let board = BoardBuilder::new().resources(0, 8).enemy_health(3).build();
    let report = play_turn(&mut ctx, &board, &strategy);
    assert_eq!(report.transitions.len(), 1);
    assert_eq!(ctx.offense().state(), OffensiveState::BreachRequested);
}

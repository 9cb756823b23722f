//! Determinism testing utilities.
//!
//! Provides a harness for verifying that turn decisions come out identical
//! given identical inputs.
//!
//! # Testing Strategy
//!
//! The agent must make the same decision for the same snapshot on any
//! machine, or replays and regression tests become meaningless. Sources of
//! non-determinism include:
//!
//! - **Floating-point math**: Different CPUs can produce different results.
//!   We use fixed-point arithmetic via [`siege_core::math::Fixed`] throughout.
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   Boards are stored in `BTreeMap`s and scanned in cell order.
//!
//! - **System randomness**: The core has none.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: Individual components (pathing, risk scores)
//! 2. **Property tests**: Random boards must still produce deterministic outputs
//! 3. **Integration tests**: Multi-turn sequences are reproducible

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use siege_core::agent::{play_turn, AgentContext};
use siege_core::board::GameState;
use siege_core::data::StrategyConfig;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of steps per run.
    pub steps: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 when deterministic).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that every run matched, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Decisions are non-deterministic!\n\
                 Runs: {}\n\
                 Steps: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.steps,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a process multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run
/// * `steps` - Number of steps per run
/// * `setup` - Function to create initial state
/// * `step` - Function to advance the state by one step
/// * `hash` - Function to compute state hash
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    steps: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..steps {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        steps,
    }
}

/// Play a sequence of snapshots from a fresh context and hash every
/// turn's intents together with the final offense state.
#[must_use]
pub fn hash_turn_sequence(turns: &[GameState], strategy: &StrategyConfig) -> u64 {
    let mut ctx = AgentContext::new();
    let mut hasher = DefaultHasher::new();
    for board in turns {
        let report = play_turn(&mut ctx, board, strategy);
        report.intents.hash(&mut hasher);
    }
    ctx.offense().state().hash(&mut hasher);
    ctx.offense().chosen_breach().hash(&mut hasher);
    hasher.finish()
}

/// Play the same snapshot sequence `runs` times and compare.
#[must_use]
pub fn verify_turn_determinism<F>(runs: usize, setup: F, strategy: &StrategyConfig) -> DeterminismResult
where
    F: Fn() -> Vec<GameState>,
{
    let mut result = verify_determinism(
        runs,
        1,
        || (setup(), 0u64),
        |state: &mut (Vec<GameState>, u64)| state.1 = hash_turn_sequence(&state.0, strategy),
        |state: &(Vec<GameState>, u64)| state.1,
    );
    result.steps = u64::try_from(setup().len()).unwrap_or(u64::MAX);
    result
}

/// Find the first turn whose intents differ between two independent plays
/// of the same snapshot sequence.
///
/// Returns `None` if both plays agree on every turn.
#[must_use]
pub fn find_first_divergence<F>(setup: F, strategy: &StrategyConfig) -> Option<usize>
where
    F: Fn() -> Vec<GameState>,
{
    let first_turns = setup();
    let second_turns = setup();
    let mut first = AgentContext::new();
    let mut second = AgentContext::new();

    for (index, (a, b)) in first_turns.iter().zip(&second_turns).enumerate() {
        let left = play_turn(&mut first, a, strategy);
        let right = play_turn(&mut second, b, strategy);
        if left.intents != right.intents {
            tracing::debug!(index, "Turn decisions diverged");
            return Some(index);
        }
    }

    None
}

/// Proptest strategies for boards and scores.
///
/// These generate random but reproducible inputs for property-based tests
/// of the risk model and the offense state machine.
pub mod strategies {
    use proptest::prelude::*;
    use siege_core::grid::{ArenaGeometry, Cell};
    use siege_core::math::Fixed;
    use siege_core::risk::{PathFactors, WeightProfile};
    use siege_core::units::UnitType;

    /// A cell anywhere inside the stock arena.
    pub fn arb_cell() -> impl Strategy<Value = Cell> {
        (0i32..28, 0i32..28)
            .prop_map(|(x, y)| Cell::new(x, y))
            .prop_filter("cell inside arena", |&cell| {
                ArenaGeometry::default().in_bounds(cell)
            })
    }

    /// A cell on the enemy half of the stock arena.
    pub fn arb_enemy_cell() -> impl Strategy<Value = Cell> {
        arb_cell().prop_map(|cell| {
            if cell.y < 14 {
                Cell::new(cell.x, 27 - cell.y)
            } else {
                cell
            }
        })
    }

    /// Any structure type.
    pub fn arb_structure_type() -> impl Strategy<Value = UnitType> {
        prop_oneof![
            Just(UnitType::Wall),
            Just(UnitType::Support),
            Just(UnitType::Turret),
        ]
    }

    /// A handful of enemy structures.
    pub fn arb_enemy_structures(max: usize) -> impl Strategy<Value = Vec<(UnitType, Cell)>> {
        proptest::collection::vec((arb_structure_type(), arb_enemy_cell()), 0..max)
    }

    /// Mobility in tenths, 0.0 to 30.0.
    pub fn arb_mobility() -> impl Strategy<Value = Fixed> {
        (0i32..=300).prop_map(|n| Fixed::from_num(n) / Fixed::from_num(10))
    }

    /// Weight profile with every weight in -1.00 to 1.00.
    pub fn arb_weight_profile() -> impl Strategy<Value = WeightProfile> {
        (-100i32..=100, -100i32..=100, -100i32..=100, -100i32..=100).prop_map(
            |(damage, length, walls, supports)| {
                WeightProfile::from_hundredths(damage, length, walls, supports)
            },
        )
    }

    /// Plausible path measurements.
    pub fn arb_path_factors() -> impl Strategy<Value = PathFactors> {
        (0i32..500, 1u32..60, 0u32..40, 0u32..40).prop_map(
            |(damage, path_length, walls, supports)| PathFactors {
                damage: Fixed::from_num(damage),
                path_length,
                enemy_wall_adjacency: walls,
                friendly_support_coverage: supports,
            },
        )
    }
}

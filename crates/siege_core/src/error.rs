//! Error types for the decision core.

use thiserror::Error;

use crate::grid::Cell;

/// Result type alias using [`SiegeError`].
pub type Result<T> = std::result::Result<T, SiegeError>;

/// Top-level error type for turn decisions.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SiegeError {
    /// A candidate spawn cell failed the legality check.
    ///
    /// Candidates must be filtered with the board's spawn check before
    /// they reach the risk model.
    #[error("Illegal spawn candidate at {0}")]
    IllegalCandidate(Cell),

    /// Spawn selection was asked to choose among nothing.
    #[error("No spawn candidates to choose from")]
    EmptyCandidateSet,

    /// The board could not produce a path from this cell.
    #[error("No path available from {0}")]
    PathUnavailable(Cell),

    /// Agent state broke one of its own invariants.
    #[error("Invariant violated: {0}")]
    InvariantViolation(String),

    /// Strategy or layout data failed to parse.
    #[error("Failed to parse config '{path}': {message}")]
    ConfigParse {
        /// Path (or label) of the source that failed to parse.
        path: String,
        /// Error message.
        message: String,
    },

    /// A turn snapshot was malformed.
    #[error("Malformed snapshot: {0}")]
    SnapshotParse(String),
}

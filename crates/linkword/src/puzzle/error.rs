//! Puzzle operation errors.

use derive_more::Display;

use crate::validation::Violations;

/// Why a puzzle operation was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum PuzzleError {
    /// The operation needs an authenticated user.
    #[display("you must be logged in")]
    LoginRequired,

    /// The user already liked the puzzle.
    #[display("puzzle already liked")]
    AlreadyLiked,

    /// Authors cannot like their own puzzles.
    #[display("cannot like your own puzzle")]
    OwnPuzzle,

    /// The puzzle has been played, so only title and description may change.
    #[display("puzzle has been played: only title and description can change")]
    ConfigLocked,

    /// The submitted puzzle breaks a structural rule.
    #[display("invalid puzzle: {}", _0)]
    Invalid(Violations),
}

impl std::error::Error for PuzzleError {}

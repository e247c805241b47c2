//! Game transition errors.

use derive_more::Display;

use crate::validation::MAX_SCORE;

/// Why a guess or completion was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum GameError {
    /// Completion attempted before the linking phase closed.
    #[display("game has not been guessed yet")]
    NotStarted,

    /// The linking phase already closed.
    #[display("game has already been guessed")]
    AlreadyGuessed,

    /// A guess must report both its start and end time.
    #[display("started and guessed times are both required")]
    TimesRequired,

    /// The guess ended before it started.
    #[display("guessed time precedes started time")]
    GuessedBeforeStarted,

    /// The linking phase ran over the time budget.
    #[display("time exceeded: {}ms taken, {}ms allowed", elapsed_ms, allowed_ms)]
    TimeExceeded {
        /// Time taken.
        elapsed_ms: i64,
        /// Time budget.
        allowed_ms: u32,
    },

    /// A guess scores at most one point per group.
    #[display("invalid score {}: a guess scores at most {}", _0, MAX_SCORE / 2)]
    InvalidScore(u8),

    /// The score disagrees with the correct groups.
    #[display("score {} does not match {} correct groups", score, correct)]
    ScoreMismatch {
        /// Claimed score.
        score: u8,
        /// Number of correct groups.
        correct: usize,
    },

    /// Correct groups repeat or are not groups of the puzzle.
    #[display("correct groups must be distinct groups of the puzzle")]
    InvalidCorrect,

    /// An attempt is not four distinct blocks of the puzzle.
    #[display("each attempt must link four distinct blocks of the puzzle")]
    InvalidAttempt,

    /// More attempts than the budget allows.
    #[display("too many attempts: {} of {}", attempts, max)]
    TooManyAttempts {
        /// Attempts made.
        attempts: usize,
        /// Attempt budget.
        max: u16,
    },

    /// Completion must report its time.
    #[display("completed time is required")]
    CompletionTimeRequired,

    /// Completion predates the end of the linking phase.
    #[display("completed time precedes guessed time")]
    CompletedBeforeGuessed,

    /// Results do not name each group of the puzzle exactly once.
    #[display("results must hold exactly one guess per puzzle group")]
    InvalidResults,

    /// Another request changed the game first.
    #[display("game was updated concurrently")]
    ConcurrentUpdate,
}

impl std::error::Error for GameError {}

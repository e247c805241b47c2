//! Linkword - game progression engine for a word-association puzzle game
//!
//! A player is shown sixteen blocks hiding four groups and must link them
//! within an attempt and time budget, then name each group's connection.
//!
//! # Architecture
//!
//! - **Games**: construction from a puzzle, the Guess and Complete
//!   transitions, challenge chains
//! - **Validation**: first-class invariants and the update gate every
//!   mutation passes through
//! - **Pagination**: opaque keyset cursors and page assembly
//! - **Repository**: persistence contracts plus an in-memory implementation
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use linkword::{GameService, MemoryRepository, PuzzleService, TextSanitizer, UserRef};
//!
//! # fn example(new_puzzle: linkword::NewPuzzle) -> Result<(), linkword::Error> {
//! let repo = Arc::new(MemoryRepository::new());
//! let sanitizer = Arc::new(TextSanitizer::default());
//! let puzzles = PuzzleService::new(repo.clone(), sanitizer.clone());
//! let games = GameService::new(repo, sanitizer);
//!
//! let author = UserRef::new("u1", "Ada");
//! let puzzle = puzzles.create(new_puzzle, Some(author))?;
//! let game = games.create(puzzle, None)?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod error;
mod game;
mod ids;
mod pagination;
mod puzzle;
mod repository;
mod sanitize;
mod validation;

#[cfg(test)]
mod test_support;

// Crate-level exports - Errors
pub use error::{Error, ErrorKind};

// Crate-level exports - Identifiers
pub use ids::{BlockId, ChallengeCode, GameId, GroupId, PuzzleId, UserId, UserRef, same_owner};

// Crate-level exports - Games
pub use game::{
    CompleteContract, Config, Contract, Game, GameError, GameNode, GameResult, GameService,
    GameSummary, GameUpdate, GuessContract,
};

// Crate-level exports - Puzzles
pub use puzzle::{
    BLOCKS_PER_GROUP, Block, Difficulty, GROUP_COUNT, Group, MAX_ANSWERS, NewGroup, NewPuzzle,
    Puzzle, PuzzleError, PuzzleNode, PuzzleService, PuzzleUpdate,
};

// Crate-level exports - Pagination
pub use pagination::{
    Accessor, CURSOR_TAG, Connection, Cursored, Edge, GameSortKey, ListParams, MAX_LIMIT, PageInfo,
    PageRequest, PaginationError, PuzzleSortKey, SortKey, SortOrder, SortValue, ValueKind,
    build_connection, decode, encode,
};

// Crate-level exports - Persistence
pub use repository::{
    GameRepository, MemoryRepository, PuzzleRepository, RepositoryError, RepositoryErrorKind,
};

// Crate-level exports - Sanitization
pub use sanitize::{Sanitizer, TextSanitizer};

// Crate-level exports - Validation
pub use validation::{
    AnswersPerGroup, AttemptsWellFormed, AttemptsWithinBudget, BlocksPerGroup, ConfigHonoursLocks,
    CorrectWellFormed, FourGroups, GameInvariants, GateError, Guarded, Invariant, InvariantSet,
    MAX_SCORE, OverridesInRange, PuzzleInvariants, ResultsWellFormed, Rule, ScoreInRange,
    ScoreMatchesCorrect, TimestampsOrdered, TimestampsPaired, TitlePresent, UniqueBlocks, UniqueIds,
    UpdateGate, Violation, Violations, validate_game, validate_puzzle,
};

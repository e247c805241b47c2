//! Persistence contracts consumed by the services.
//!
//! Implementations must provide read-your-writes and make the
//! "not already guessed / completed" precondition race-safe: an update that
//! loses the race reports [`RepositoryErrorKind::Conflict`].

mod memory;

pub use memory::MemoryRepository;

use derive_more::{Display, Error};
use tracing::instrument;

use crate::game::{Game, GameNode};
use crate::ids::{ChallengeCode, GameId, PuzzleId, UserId, UserRef};
use crate::pagination::{GameSortKey, ListParams, PuzzleSortKey};
use crate::puzzle::{Puzzle, PuzzleNode};

/// Classification of a repository failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum RepositoryErrorKind {
    /// The requested row does not exist.
    #[display("not found")]
    NotFound,
    /// A conditional write lost a race, or a uniqueness rule was hit.
    #[display("conflict")]
    Conflict,
    /// The storage backend failed.
    #[display("backend failure")]
    Backend,
}

/// Repository error with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Repository error ({}): {} at {}:{}", kind, message, file, line)]
pub struct RepositoryError {
    /// Failure class.
    pub kind: RepositoryErrorKind,
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl RepositoryError {
    /// Creates a new repository error with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(kind: RepositoryErrorKind, message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            kind,
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }

    /// A missing row.
    #[track_caller]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(RepositoryErrorKind::NotFound, message)
    }

    /// A lost conditional write.
    #[track_caller]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(RepositoryErrorKind::Conflict, message)
    }

    /// A backend failure.
    #[track_caller]
    pub fn backend(message: impl Into<String>) -> Self {
        Self::new(RepositoryErrorKind::Backend, message)
    }

    /// Returns true for [`RepositoryErrorKind::NotFound`].
    pub fn is_not_found(&self) -> bool {
        self.kind == RepositoryErrorKind::NotFound
    }

    /// Returns true for [`RepositoryErrorKind::Conflict`].
    pub fn is_conflict(&self) -> bool {
        self.kind == RepositoryErrorKind::Conflict
    }
}

/// Storage of games.
///
/// `viewer` never filters results; it only decides the viewer-relative
/// fields of the embedded puzzle (`liked`).
pub trait GameRepository: Send + Sync {
    /// Persists a new game and returns it as stored.
    fn create(&self, game: Game) -> Result<Game, RepositoryError>;

    /// Loads a game by id.
    fn get(&self, id: GameId, viewer: Option<&UserRef>) -> Result<Game, RepositoryError>;

    /// Loads a game by its challenge code.
    fn get_with_challenge_code(
        &self,
        code: &ChallengeCode,
        viewer: Option<&UserRef>,
    ) -> Result<Game, RepositoryError>;

    /// Completed games of `for_user`, ordered and bounded by `params`.
    ///
    /// Returns up to [`ListParams::fetch_limit`] rows.
    fn get_played(
        &self,
        params: &ListParams<GameSortKey>,
        for_user: &UserId,
        viewer: Option<&UserRef>,
    ) -> Result<Vec<GameNode>, RepositoryError>;

    /// Writes a transitioned game.
    ///
    /// The write is conditional on the stored game not having been completed
    /// (when `game` is complete) or guessed (otherwise); a lost race returns
    /// [`RepositoryErrorKind::Conflict`].
    fn update(&self, game: Game) -> Result<Game, RepositoryError>;
}

/// Storage of puzzles and likes.
pub trait PuzzleRepository: Send + Sync {
    /// Persists a new puzzle and returns it as stored.
    fn create(&self, puzzle: Puzzle) -> Result<Puzzle, RepositoryError>;

    /// Loads a puzzle by id.
    fn get(&self, id: PuzzleId, viewer: Option<&UserRef>) -> Result<Puzzle, RepositoryError>;

    /// Writes the editable fields of a puzzle. Likes are left untouched.
    fn update(&self, puzzle: Puzzle) -> Result<Puzzle, RepositoryError>;

    /// Puzzles ordered and bounded by `params`.
    ///
    /// Returns up to [`ListParams::fetch_limit`] rows.
    fn list(
        &self,
        params: &ListParams<PuzzleSortKey>,
        viewer: Option<&UserRef>,
    ) -> Result<Vec<PuzzleNode>, RepositoryError>;

    /// Records a like by `user`.
    ///
    /// Returns [`RepositoryErrorKind::Conflict`] if `user` already liked it.
    fn like(&self, id: PuzzleId, user: &UserRef) -> Result<Puzzle, RepositoryError>;

    /// Returns true if any game of the puzzle has started.
    fn is_played(&self, id: PuzzleId) -> Result<bool, RepositoryError>;
}

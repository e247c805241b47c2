//! Top-level error type of the engine.

use derive_more::Display;
use serde::Serialize;

use crate::game::GameError;
use crate::pagination::PaginationError;
use crate::puzzle::PuzzleError;
use crate::repository::{RepositoryError, RepositoryErrorKind};
use crate::validation::{GateError, Violations};

/// How a caller should treat a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
pub enum ErrorKind {
    /// The request is malformed or breaks a rule.
    #[display("bad request")]
    BadRequest,
    /// The request needs an authenticated user.
    #[display("unauthorized")]
    Unauthorized,
    /// The user may not perform the request.
    #[display("forbidden")]
    Forbidden,
    /// The entity does not exist for this user.
    #[display("not found")]
    NotFound,
    /// Something broke on our side.
    #[display("internal error")]
    Internal,
}

/// Any failure of an engine operation.
#[derive(Debug, Clone, Display)]
pub enum Error {
    /// Rejected by the update gate.
    #[display("{}", _0)]
    Gate(GateError),

    /// A game transition precondition failed.
    #[display("{}", _0)]
    Game(GameError),

    /// A puzzle operation was rejected.
    #[display("{}", _0)]
    Puzzle(PuzzleError),

    /// The list request is invalid.
    #[display("{}", _0)]
    Pagination(PaginationError),

    /// A fetched page could not be assembled.
    #[display("list fetch failed: {}", _0)]
    ListFetch(PaginationError),

    /// Persistence failed.
    #[display("{}", _0)]
    Repository(RepositoryError),
}

impl Error {
    /// Classifies the failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Gate(GateError::NotFound) => ErrorKind::NotFound,
            Self::Gate(GateError::Corrupt(_)) => ErrorKind::Internal,
            Self::Gate(_) => ErrorKind::BadRequest,
            Self::Game(_) => ErrorKind::BadRequest,
            Self::Puzzle(PuzzleError::LoginRequired) => ErrorKind::Unauthorized,
            Self::Puzzle(PuzzleError::OwnPuzzle) => ErrorKind::Forbidden,
            Self::Puzzle(_) => ErrorKind::BadRequest,
            Self::Pagination(_) => ErrorKind::BadRequest,
            Self::ListFetch(_) => ErrorKind::Internal,
            Self::Repository(err) => match err.kind {
                RepositoryErrorKind::NotFound => ErrorKind::NotFound,
                RepositoryErrorKind::Conflict => ErrorKind::BadRequest,
                RepositoryErrorKind::Backend => ErrorKind::Internal,
            },
        }
    }

    /// Violated rules, when the failure is a validation failure.
    pub fn violations(&self) -> Option<&Violations> {
        match self {
            Self::Gate(GateError::Invalid(v) | GateError::Corrupt(v)) => Some(v),
            Self::Puzzle(PuzzleError::Invalid(v)) => Some(v),
            _ => None,
        }
    }

    /// Message safe to show to the user. Internal details are withheld.
    pub fn public_message(&self) -> String {
        match self.kind() {
            ErrorKind::Internal => ErrorKind::Internal.to_string(),
            ErrorKind::NotFound => ErrorKind::NotFound.to_string(),
            _ => self.to_string(),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Gate(err) => Some(err),
            Self::Game(err) => Some(err),
            Self::Puzzle(err) => Some(err),
            Self::Pagination(err) | Self::ListFetch(err) => Some(err),
            Self::Repository(err) => Some(err),
        }
    }
}

impl From<GateError> for Error {
    fn from(err: GateError) -> Self {
        Self::Gate(err)
    }
}

impl From<GameError> for Error {
    fn from(err: GameError) -> Self {
        Self::Game(err)
    }
}

impl From<PuzzleError> for Error {
    fn from(err: PuzzleError) -> Self {
        Self::Puzzle(err)
    }
}

impl From<PaginationError> for Error {
    fn from(err: PaginationError) -> Self {
        Self::Pagination(err)
    }
}

impl From<RepositoryError> for Error {
    fn from(err: RepositoryError) -> Self {
        Self::Repository(err)
    }
}

//! Keyset pagination: cursor codec, page assembly and request validation.

mod connection;
mod cursor;
mod params;

pub use connection::{Connection, Edge, PageInfo, build_connection};
pub use cursor::{Accessor, CURSOR_TAG, Cursored, SortValue, ValueKind, decode, encode};
pub use params::{
    GameSortKey, ListParams, MAX_LIMIT, PageRequest, PuzzleSortKey, SortKey, SortOrder,
};

/// Error raised while validating a list request or encoding cursors.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum PaginationError {
    /// The cursor is not a token this service issued.
    #[display("invalid cursor")]
    InvalidCursor,

    /// The sort key is unknown, or the entity has no value for it.
    #[display("invalid sort key: {}", _0)]
    InvalidKey(String),

    /// The page size is outside 1 to 100.
    #[display("invalid limit {}: must be between 1 and {}", _0, MAX_LIMIT)]
    InvalidLimit(i64),
}

impl std::error::Error for PaginationError {}

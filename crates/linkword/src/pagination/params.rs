//! Validated list requests.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::str::FromStr;
use strum::{AsRefStr, Display, EnumString};
use tracing::{instrument, warn};

use super::{PaginationError, SortValue, ValueKind, decode};

/// Largest page a client may request.
pub const MAX_LIMIT: i64 = 100;

fn default_limit() -> i64 {
    20
}

fn default_sort_key() -> String {
    "createdAt".to_string()
}

/// Direction of a keyset scan.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum SortOrder {
    /// Smallest first.
    #[serde(alias = "asc")]
    Asc,
    /// Largest first.
    #[default]
    #[serde(alias = "desc")]
    Desc,
}

impl SortOrder {
    /// Returns true if `value` lies strictly beyond `boundary` in this order.
    pub fn is_after(self, value: &SortValue, boundary: &SortValue) -> bool {
        match self {
            Self::Asc => value > boundary,
            Self::Desc => value < boundary,
        }
    }
}

/// A named column a list may be ordered by.
pub trait SortKey: Copy + Debug + FromStr + AsRef<str> {
    /// The kind of value stored under this key.
    fn kind(self) -> ValueKind;
}

/// Sort keys of played-game history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "camelCase", ascii_case_insensitive)]
pub enum GameSortKey {
    /// Game creation time.
    CreatedAt,
    /// Game completion time.
    CompletedAt,
}

impl SortKey for GameSortKey {
    fn kind(self) -> ValueKind {
        ValueKind::Time
    }
}

/// Sort keys of puzzle listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "camelCase", ascii_case_insensitive)]
pub enum PuzzleSortKey {
    /// Most recent.
    CreatedAt,
    /// Most liked.
    NumLikes,
}

impl SortKey for PuzzleSortKey {
    fn kind(self) -> ValueKind {
        match self {
            Self::CreatedAt => ValueKind::Time,
            Self::NumLikes => ValueKind::Unsigned,
        }
    }
}

/// A list request as it arrives from a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    /// Opaque cursor from a previous page.
    #[serde(default)]
    pub cursor: Option<String>,
    /// Page size, 1 to 100.
    #[serde(default = "default_limit")]
    pub limit: i64,
    /// Name of the sort key.
    #[serde(default = "default_sort_key")]
    pub sort_key: String,
    /// Scan direction.
    #[serde(default)]
    pub sort_order: SortOrder,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            cursor: None,
            limit: default_limit(),
            sort_key: default_sort_key(),
            sort_order: SortOrder::default(),
        }
    }
}

impl PageRequest {
    /// Creates a first-page request.
    pub fn new(sort_key: impl Into<String>, sort_order: SortOrder, limit: i64) -> Self {
        Self {
            cursor: None,
            limit,
            sort_key: sort_key.into(),
            sort_order,
        }
    }

    /// Returns the same request resumed after `cursor`.
    pub fn after(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = Some(cursor.into());
        self
    }
}

/// A validated list request ready for a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListParams<K> {
    /// Decoded keyset boundary; rows must lie strictly beyond it.
    pub after: Option<SortValue>,
    /// Page size.
    pub limit: usize,
    /// Sort key.
    pub sort_key: K,
    /// Scan direction.
    pub sort_order: SortOrder,
}

impl<K: SortKey> ListParams<K> {
    /// Validates a client request.
    ///
    /// # Errors
    ///
    /// - [`PaginationError::InvalidKey`] for an unknown sort key
    /// - [`PaginationError::InvalidLimit`] for a limit outside 1 to 100
    /// - [`PaginationError::InvalidCursor`] for an undecodable cursor
    #[instrument]
    pub fn parse(request: &PageRequest) -> Result<Self, PaginationError> {
        let sort_key = K::from_str(&request.sort_key).map_err(|_| {
            warn!(sort_key = %request.sort_key, "Unknown sort key");
            PaginationError::InvalidKey(request.sort_key.clone())
        })?;

        if !(1..=MAX_LIMIT).contains(&request.limit) {
            warn!(limit = request.limit, "Limit out of range");
            return Err(PaginationError::InvalidLimit(request.limit));
        }

        let after = match request.cursor.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(token) => {
                let raw = decode(token)?;
                Some(
                    sort_key
                        .kind()
                        .parse(&raw)
                        .ok_or(PaginationError::InvalidCursor)?,
                )
            }
        };

        Ok(Self {
            after,
            limit: request.limit as usize,
            sort_key,
            sort_order: request.sort_order,
        })
    }

    /// Number of rows a repository should fetch: one more than the page.
    pub fn fetch_limit(&self) -> usize {
        self.limit + 1
    }

    /// Name of the sort key, as used for cursor encoding.
    pub fn key_name(&self) -> &str {
        self.sort_key.as_ref()
    }
}

//! Opaque keyset cursors.
//!
//! A cursor is the canonical rendering of one sortable field of an entity,
//! prefixed with [`CURSOR_TAG`] and base64 encoded. Which fields are sortable
//! is declared per entity through [`Cursored::SORT_KEYS`].

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{debug, instrument};

use super::PaginationError;

/// Constant prefix of every decoded cursor.
pub const CURSOR_TAG: &str = "cursor:";

/// A typed sort-key value extracted from an entity.
///
/// Values of one key always share a variant, so the derived ordering is the
/// natural ordering of the field.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortValue {
    /// Rendered verbatim.
    Text(String),
    /// Rendered in base 10.
    Unsigned(u64),
    /// Rendered as RFC 3339 with nanoseconds, in UTC.
    Time(DateTime<Utc>),
}

impl SortValue {
    /// Canonical string form of the value.
    pub fn render(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Unsigned(n) => n.to_string(),
            Self::Time(t) => t.to_rfc3339_opts(SecondsFormat::Nanos, true),
        }
    }
}

/// The kind of value a sort key holds, used to parse decoded cursors back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Free text.
    Text,
    /// Unsigned integer.
    Unsigned,
    /// Timestamp.
    Time,
}

impl ValueKind {
    /// Parses a rendered value of this kind.
    pub fn parse(self, raw: &str) -> Option<SortValue> {
        match self {
            Self::Text => Some(SortValue::Text(raw.to_string())),
            Self::Unsigned => raw.parse().ok().map(SortValue::Unsigned),
            Self::Time => DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|t| SortValue::Time(t.with_timezone(&Utc))),
        }
    }
}

/// Extracts a sort-key value; `None` when the entity has no value for it.
pub type Accessor<T> = fn(&T) -> Option<SortValue>;

/// An entity that can be paginated by keyset cursors.
pub trait Cursored: Sized + 'static {
    /// Sort-key names and their accessors. Names match case-insensitively.
    const SORT_KEYS: &'static [(&'static str, Accessor<Self>)];

    /// Looks up the accessor for `key`.
    fn accessor(key: &str) -> Option<Accessor<Self>> {
        Self::SORT_KEYS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(key))
            .map(|(_, accessor)| *accessor)
    }
}

/// Encodes the `key` field of `entity` into an opaque cursor.
///
/// # Errors
///
/// Returns [`PaginationError::InvalidKey`] if `key` is not a sort key of the
/// entity or the entity has no value for it.
#[instrument(skip(entity))]
pub fn encode<T: Cursored>(key: &str, entity: &T) -> Result<String, PaginationError> {
    let accessor = T::accessor(key).ok_or_else(|| PaginationError::InvalidKey(key.to_string()))?;
    let value = accessor(entity).ok_or_else(|| PaginationError::InvalidKey(key.to_string()))?;
    Ok(STANDARD.encode(format!("{CURSOR_TAG}{}", value.render())))
}

/// Decodes a cursor back to the rendered field value.
///
/// # Errors
///
/// Returns [`PaginationError::InvalidCursor`] if the token is not base64, not
/// UTF-8, or lacks the cursor tag.
#[instrument]
pub fn decode(token: &str) -> Result<String, PaginationError> {
    let bytes = STANDARD
        .decode(token.trim())
        .map_err(|_| PaginationError::InvalidCursor)?;
    let text = String::from_utf8(bytes).map_err(|_| PaginationError::InvalidCursor)?;
    let value = text
        .strip_prefix(CURSOR_TAG)
        .ok_or(PaginationError::InvalidCursor)?;
    debug!(value = %value, "Cursor decoded");
    Ok(value.to_string())
}

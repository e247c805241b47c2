//! Identifier newtypes and user references.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use derive_more::{Display, From};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            Serialize,
            Deserialize,
            Display,
            From,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generates a fresh random identifier.
            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }

            /// Returns the underlying UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }
    };
}

uuid_id! {
    /// Identifies a game session.
    GameId
}

uuid_id! {
    /// Identifies a puzzle.
    PuzzleId
}

uuid_id! {
    /// Identifies one of the four groups of a puzzle.
    GroupId
}

uuid_id! {
    /// Identifies one of the sixteen blocks of a puzzle.
    BlockId
}

/// Identifier of an authenticated user, as issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, From)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Wraps a raw identity-provider id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The acting or owning user of an entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRef {
    /// Stable user id.
    pub id: UserId,
    /// Display name at the time the reference was taken.
    pub name: String,
}

impl UserRef {
    /// Creates a user reference.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: UserId::new(id),
            name: name.into(),
        }
    }
}

/// Returns true when `actor` is allowed to act on something owned by `owner`.
///
/// Ownership holds if both sides are anonymous or both ids match.
pub fn same_owner(owner: Option<&UserRef>, actor: Option<&UserRef>) -> bool {
    match (owner, actor) {
        (None, None) => true,
        (Some(owner), Some(actor)) => owner.id == actor.id,
        _ => false,
    }
}

/// Opaque code that lets other players replay a game's configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From)]
#[serde(transparent)]
pub struct ChallengeCode(String);

impl ChallengeCode {
    /// Generates a fresh, globally unique code (URL-safe, 22 characters).
    pub fn generate() -> Self {
        Self(URL_SAFE_NO_PAD.encode(Uuid::new_v4().as_bytes()))
    }

    /// Wraps an existing code.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Returns the code text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_owner_matches_anonymous_actor() {
        assert!(same_owner(None, None));
    }

    #[test]
    fn test_owner_requires_matching_ids() {
        let alice = UserRef::new("u1", "Alice");
        let renamed = UserRef::new("u1", "Alicia");
        let bob = UserRef::new("u2", "Bob");

        assert!(same_owner(Some(&alice), Some(&renamed)));
        assert!(!same_owner(Some(&alice), Some(&bob)));
        assert!(!same_owner(Some(&alice), None));
        assert!(!same_owner(None, Some(&bob)));
    }

    #[test]
    fn test_challenge_codes_are_unique_and_url_safe() {
        let a = ChallengeCode::generate();
        let b = ChallengeCode::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 22);
        assert!(
            a.as_str()
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn test_game_id_parses_from_string() {
        let id = GameId::generate();
        let parsed: GameId = id.to_string().parse().expect("parse failed");
        assert_eq!(id, parsed);
    }
}

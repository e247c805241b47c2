//! The precondition gate every mutation passes through.
//!
//! A mutation is admitted in three steps:
//!
//! 1. [`UpdateGate::admit`]: identity, terminal state, stored-state validity
//!    and ownership
//! 2. [`UpdateGate::strip`]: build the candidate, copying every field the
//!    caller has no authority over from the stored entity
//! 3. [`UpdateGate::commit`]: validate the candidate
//!
//! Transition-specific checks run between the steps.

use derive_more::Display;
use std::fmt::Display as FmtDisplay;
use tracing::{debug, instrument, warn};

use super::Violations;
use crate::ids::{UserRef, same_owner};

/// An entity whose mutations go through the [`UpdateGate`].
pub trait Guarded: Sized {
    /// Identifier type.
    type Id: PartialEq + FmtDisplay;
    /// The caller-supplied proposal.
    type Update;

    /// Id of the stored entity.
    fn guard_id(&self) -> Self::Id;

    /// Id the update targets.
    fn update_id(update: &Self::Update) -> Self::Id;

    /// Returns true if the entity can no longer change.
    fn is_terminal(&self) -> bool;

    /// Owner of the entity.
    fn owner(&self) -> Option<&UserRef>;

    /// Full structural validation.
    fn check(&self) -> Result<(), Violations>;

    /// Builds the candidate from `update`, keeping immutable and locked
    /// fields from `self`.
    fn strip(&self, update: Self::Update) -> Self;
}

/// Rejection raised by the gate.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum GateError {
    /// The update targets a different entity than the one loaded.
    #[display("update targets {} but {} was loaded", _0, _1)]
    IdMismatch(String, String),

    /// The entity is terminal.
    #[display("already complete")]
    AlreadyComplete,

    /// The stored entity breaks its own invariants.
    #[display("stored state is invalid: {}", _0)]
    Corrupt(Violations),

    /// The candidate breaks an invariant.
    #[display("invalid update: {}", _0)]
    Invalid(Violations),

    /// The actor does not own the entity. Reported as absence so existence
    /// is not revealed.
    #[display("not found")]
    NotFound,
}

impl std::error::Error for GateError {}

/// Guards one mutation of a stored entity by one actor.
#[derive(Debug)]
pub struct UpdateGate<'a, T> {
    stored: &'a T,
    actor: Option<&'a UserRef>,
}

impl<'a, T: Guarded> UpdateGate<'a, T> {
    /// Creates a gate for `actor` mutating `stored`.
    pub fn new(stored: &'a T, actor: Option<&'a UserRef>) -> Self {
        Self { stored, actor }
    }

    /// Runs the checks shared by every transition.
    ///
    /// # Errors
    ///
    /// Returns the first failing check, in the order identity, terminal,
    /// stored validity, ownership.
    #[instrument(skip_all, fields(id = %self.stored.guard_id()))]
    pub fn admit(&self, update: &T::Update) -> Result<(), GateError> {
        let target = T::update_id(update);
        let stored_id = self.stored.guard_id();
        if target != stored_id {
            warn!(target = %target, "Update targets another entity");
            return Err(GateError::IdMismatch(target.to_string(), stored_id.to_string()));
        }

        if self.stored.is_terminal() {
            warn!("Update rejected: entity is terminal");
            return Err(GateError::AlreadyComplete);
        }

        self.stored.check().map_err(GateError::Corrupt)?;

        if !same_owner(self.stored.owner(), self.actor) {
            warn!(
                actor = ?self.actor.map(|a| a.id.as_str()),
                "Update rejected: actor does not own entity"
            );
            return Err(GateError::NotFound);
        }

        debug!("Update admitted");
        Ok(())
    }

    /// Builds the candidate with immutable fields restored.
    pub fn strip(&self, update: T::Update) -> T {
        self.stored.strip(update)
    }

    /// Validates the candidate.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::Invalid`] with every violated rule.
    #[instrument(skip_all, fields(id = %candidate.guard_id()))]
    pub fn commit(&self, candidate: T) -> Result<T, GateError> {
        candidate.check().map_err(GateError::Invalid)?;
        Ok(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{Rule, Violation};

    #[derive(Debug, Clone, PartialEq)]
    struct Note {
        id: u32,
        text: String,
        done: bool,
        author: Option<UserRef>,
    }

    struct NoteUpdate {
        id: u32,
        text: String,
    }

    impl Guarded for Note {
        type Id = u32;
        type Update = NoteUpdate;

        fn guard_id(&self) -> u32 {
            self.id
        }

        fn update_id(update: &NoteUpdate) -> u32 {
            update.id
        }

        fn is_terminal(&self) -> bool {
            self.done
        }

        fn owner(&self) -> Option<&UserRef> {
            self.author.as_ref()
        }

        fn check(&self) -> Result<(), Violations> {
            if self.text.is_empty() {
                Err(Violations(vec![Violation::new(Rule::TitlePresent)]))
            } else {
                Ok(())
            }
        }

        fn strip(&self, update: NoteUpdate) -> Self {
            Self {
                text: update.text,
                ..self.clone()
            }
        }
    }

    fn note(author: Option<UserRef>) -> Note {
        Note {
            id: 1,
            text: "hello".to_string(),
            done: false,
            author,
        }
    }

    fn edit(id: u32, text: &str) -> NoteUpdate {
        NoteUpdate {
            id,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_admits_owner() {
        let alice = UserRef::new("a", "Alice");
        let stored = note(Some(alice.clone()));
        let gate = UpdateGate::new(&stored, Some(&alice));
        let update = edit(1, "bye");
        assert!(gate.admit(&update).is_ok());
        let candidate = gate.commit(gate.strip(update)).unwrap();
        assert_eq!(candidate.text, "bye");
        assert_eq!(candidate.author, Some(alice));
    }

    #[test]
    fn test_rejects_other_id() {
        let stored = note(None);
        let gate = UpdateGate::new(&stored, None);
        assert_eq!(
            gate.admit(&edit(2, "x")),
            Err(GateError::IdMismatch("2".to_string(), "1".to_string()))
        );
    }

    #[test]
    fn test_terminal_checked_before_owner() {
        let mut stored = note(Some(UserRef::new("a", "Alice")));
        stored.done = true;
        let gate = UpdateGate::new(&stored, None);
        assert_eq!(gate.admit(&edit(1, "x")), Err(GateError::AlreadyComplete));
    }

    #[test]
    fn test_non_owner_sees_not_found() {
        let stored = note(Some(UserRef::new("a", "Alice")));
        let bob = UserRef::new("b", "Bob");
        assert_eq!(
            UpdateGate::new(&stored, Some(&bob)).admit(&edit(1, "x")),
            Err(GateError::NotFound)
        );
        assert_eq!(
            UpdateGate::new(&stored, None).admit(&edit(1, "x")),
            Err(GateError::NotFound)
        );
    }

    #[test]
    fn test_commit_rejects_invalid_candidate() {
        let stored = note(None);
        let gate = UpdateGate::new(&stored, None);
        let candidate = gate.strip(edit(1, ""));
        assert!(matches!(gate.commit(candidate), Err(GateError::Invalid(_))));
    }

    #[test]
    fn test_corrupt_stored_state_reported() {
        let mut stored = note(None);
        stored.text.clear();
        let gate = UpdateGate::new(&stored, None);
        assert!(matches!(gate.admit(&edit(1, "x")), Err(GateError::Corrupt(_))));
    }
}

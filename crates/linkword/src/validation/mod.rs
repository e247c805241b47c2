//! First-class invariants and the shared update gate.
//!
//! Invariants are logical properties that must hold for a game or puzzle at
//! any point of its life. Each one is a zero-sized type so they can be tested
//! on their own and composed into per-entity sets.

mod gate;
mod game;
mod puzzle;

pub use game::{
    AttemptsWellFormed, AttemptsWithinBudget, ConfigHonoursLocks, CorrectWellFormed, GameInvariants,
    MAX_SCORE, ResultsWellFormed, ScoreInRange, ScoreMatchesCorrect, TimestampsOrdered,
    TimestampsPaired, validate_game,
};
pub use gate::{GateError, Guarded, UpdateGate};
pub use puzzle::{
    AnswersPerGroup, BlocksPerGroup, FourGroups, OverridesInRange, PuzzleInvariants, TitlePresent,
    UniqueBlocks, UniqueIds, validate_puzzle,
};

use derive_more::Display;
use serde::Serialize;

/// Identifier of a data-model rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    /// Attempts hold exactly four unique blocks of the puzzle.
    #[display("each attempt must link four distinct blocks of the puzzle")]
    AttemptsWellFormed,
    /// Attempt count respects the configured budget.
    #[display("attempt count exceeds the allowed maximum")]
    AttemptsWithinBudget,
    /// Correct groups are unique puzzle groups.
    #[display("correct groups must be distinct groups of the puzzle")]
    CorrectWellFormed,
    /// Score stays within 0..=8.
    #[display("score is out of range")]
    ScoreInRange,
    /// Score equals what the correct groups and results earn.
    #[display("score does not match the correct groups and results")]
    ScoreMatchesCorrect,
    /// Start and guess times are set together.
    #[display("started and guessed times must be set together")]
    TimestampsPaired,
    /// Lifecycle timestamps never go backwards.
    #[display("lifecycle timestamps are out of order")]
    TimestampsOrdered,
    /// Results are absent, or one per puzzle group once complete.
    #[display("results must hold exactly one entry per puzzle group")]
    ResultsWellFormed,
    /// Locked config fields match the puzzle.
    #[display("config differs from the values locked by the puzzle")]
    ConfigHonoursLocks,
    /// Puzzle title is present and short enough.
    #[display("title must be between 1 and 64 characters")]
    TitlePresent,
    /// Puzzle has exactly four groups.
    #[display("a puzzle has exactly four groups")]
    FourGroups,
    /// Each group accepts one to eight non-empty answers.
    #[display("each group needs between 1 and 8 answers")]
    AnswersPerGroup,
    /// Each group has exactly four non-empty blocks.
    #[display("each group needs exactly four blocks")]
    BlocksPerGroup,
    /// Block values are unique across the puzzle.
    #[display("block values must be unique")]
    UniqueBlocks,
    /// Group and block ids are unique.
    #[display("group and block ids must be unique")]
    UniqueIds,
    /// Attempt and time overrides are within bounds.
    #[display("attempt or time override is out of bounds")]
    OverridesInRange,
}

/// A logical property that must hold for a given state.
pub trait Invariant<S> {
    /// Checks if the invariant holds for the given state.
    fn holds(state: &S) -> bool;

    /// The rule this invariant enforces.
    fn rule() -> Rule;
}

/// Violation of an invariant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[display("{}", rule)]
pub struct Violation {
    /// The violated rule.
    pub rule: Rule,
}

impl Violation {
    /// Creates a new violation.
    pub fn new(rule: Rule) -> Self {
        Self { rule }
    }
}

/// The non-empty list of rules a state violated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Violations(pub Vec<Violation>);

impl Violations {
    /// Returns true if `rule` is among the violations.
    pub fn contains(&self, rule: Rule) -> bool {
        self.0.iter().any(|v| v.rule == rule)
    }

    /// Returns the violated rules in check order.
    pub fn rules(&self) -> Vec<Rule> {
        self.0.iter().map(|v| v.rule).collect()
    }
}

impl std::fmt::Display for Violations {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let joined = self
            .0
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        f.write_str(&joined)
    }
}

/// A set of invariants that can be checked together.
///
/// Implemented for tuples of invariants, so an entity's full rule set is a
/// type alias.
pub trait InvariantSet<S> {
    /// Checks all invariants in the set, collecting every violation.
    fn check_all(state: &S) -> Result<(), Violations>;
}

macro_rules! impl_invariant_set {
    ($($inv:ident),+) => {
        impl<S, $($inv),+> InvariantSet<S> for ($($inv,)+)
        where
            $($inv: Invariant<S>,)+
        {
            fn check_all(state: &S) -> Result<(), Violations> {
                let mut violations = Vec::new();
                $(
                    if !$inv::holds(state) {
                        violations.push(Violation::new($inv::rule()));
                    }
                )+
                if violations.is_empty() {
                    Ok(())
                } else {
                    Err(Violations(violations))
                }
            }
        }
    };
}

impl_invariant_set!(I1);
impl_invariant_set!(I1, I2);
impl_invariant_set!(I1, I2, I3);
impl_invariant_set!(I1, I2, I3, I4);
impl_invariant_set!(I1, I2, I3, I4, I5);
impl_invariant_set!(I1, I2, I3, I4, I5, I6);
impl_invariant_set!(I1, I2, I3, I4, I5, I6, I7);
impl_invariant_set!(I1, I2, I3, I4, I5, I6, I7, I8);
impl_invariant_set!(I1, I2, I3, I4, I5, I6, I7, I8, I9);

#[cfg(test)]
mod tests {
    use super::*;

    struct Even;
    struct Small;

    impl Invariant<u32> for Even {
        fn holds(state: &u32) -> bool {
            state % 2 == 0
        }

        fn rule() -> Rule {
            Rule::ScoreInRange
        }
    }

    impl Invariant<u32> for Small {
        fn holds(state: &u32) -> bool {
            *state < 10
        }

        fn rule() -> Rule {
            Rule::AttemptsWithinBudget
        }
    }

    #[test]
    fn test_set_holds_when_all_hold() {
        assert!(<(Even, Small)>::check_all(&4u32).is_ok());
    }

    #[test]
    fn test_set_collects_every_violation() {
        let violations = <(Even, Small)>::check_all(&13u32).unwrap_err();
        assert_eq!(
            violations.rules(),
            vec![Rule::ScoreInRange, Rule::AttemptsWithinBudget]
        );
    }

    #[test]
    fn test_violations_display_joins_messages() {
        let violations = <(Even,)>::check_all(&3u32).unwrap_err();
        assert_eq!(violations.to_string(), "score is out of range");
    }
}

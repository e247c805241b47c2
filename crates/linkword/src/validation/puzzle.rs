//! Structural invariants of a puzzle.

use std::collections::HashSet;
use tracing::{instrument, warn};

use super::{Invariant, InvariantSet, Rule, Violations};
use crate::puzzle::{BLOCKS_PER_GROUP, GROUP_COUNT, MAX_ANSWERS, Puzzle};

/// Longest accepted title, in characters.
pub const MAX_TITLE_CHARS: usize = 64;
/// Largest attempt override.
pub const MAX_ATTEMPTS_OVERRIDE: u16 = 100;
/// Largest time override: one hour.
pub const MAX_TIME_OVERRIDE_MS: u32 = 3_600_000;

/// Invariant: the title is present and at most [`MAX_TITLE_CHARS`] long.
pub struct TitlePresent;

impl Invariant<Puzzle> for TitlePresent {
    fn holds(puzzle: &Puzzle) -> bool {
        let title = puzzle.title.trim();
        !title.is_empty() && title.chars().count() <= MAX_TITLE_CHARS
    }

    fn rule() -> Rule {
        Rule::TitlePresent
    }
}

/// Invariant: exactly four groups.
pub struct FourGroups;

impl Invariant<Puzzle> for FourGroups {
    fn holds(puzzle: &Puzzle) -> bool {
        puzzle.groups.len() == GROUP_COUNT
    }

    fn rule() -> Rule {
        Rule::FourGroups
    }
}

/// Invariant: every group accepts one to eight non-empty answers.
pub struct AnswersPerGroup;

impl Invariant<Puzzle> for AnswersPerGroup {
    fn holds(puzzle: &Puzzle) -> bool {
        puzzle.groups.iter().all(|group| {
            (1..=MAX_ANSWERS).contains(&group.answers.len())
                && group.answers.iter().all(|a| !a.trim().is_empty())
        })
    }

    fn rule() -> Rule {
        Rule::AnswersPerGroup
    }
}

/// Invariant: every group has four non-empty blocks.
pub struct BlocksPerGroup;

impl Invariant<Puzzle> for BlocksPerGroup {
    fn holds(puzzle: &Puzzle) -> bool {
        puzzle.groups.iter().all(|group| {
            group.blocks.len() == BLOCKS_PER_GROUP
                && group.blocks.iter().all(|b| !b.value.trim().is_empty())
        })
    }

    fn rule() -> Rule {
        Rule::BlocksPerGroup
    }
}

/// Invariant: no two blocks show the same text, ignoring case.
pub struct UniqueBlocks;

impl Invariant<Puzzle> for UniqueBlocks {
    fn holds(puzzle: &Puzzle) -> bool {
        let mut seen = HashSet::new();
        puzzle
            .groups
            .iter()
            .flat_map(|group| &group.blocks)
            .all(|block| seen.insert(block.value.trim().to_lowercase()))
    }

    fn rule() -> Rule {
        Rule::UniqueBlocks
    }
}

/// Invariant: group ids and block ids are unique.
pub struct UniqueIds;

impl Invariant<Puzzle> for UniqueIds {
    fn holds(puzzle: &Puzzle) -> bool {
        let groups: HashSet<_> = puzzle.group_ids().collect();
        let blocks: HashSet<_> = puzzle.block_ids().collect();
        groups.len() == puzzle.groups.len() && blocks.len() == puzzle.block_ids().count()
    }

    fn rule() -> Rule {
        Rule::UniqueIds
    }
}

/// Invariant: overrides stay within sane bounds.
pub struct OverridesInRange;

impl Invariant<Puzzle> for OverridesInRange {
    fn holds(puzzle: &Puzzle) -> bool {
        puzzle.max_attempts <= MAX_ATTEMPTS_OVERRIDE && puzzle.time_allowed <= MAX_TIME_OVERRIDE_MS
    }

    fn rule() -> Rule {
        Rule::OverridesInRange
    }
}

/// All puzzle invariants as a composable set.
pub type PuzzleInvariants = (
    TitlePresent,
    FourGroups,
    AnswersPerGroup,
    BlocksPerGroup,
    UniqueBlocks,
    UniqueIds,
    OverridesInRange,
);

/// Checks every puzzle invariant.
///
/// # Errors
///
/// Returns the violated rules, in check order.
#[instrument(skip(puzzle), fields(puzzle_id = %puzzle.id))]
pub fn validate_puzzle(puzzle: &Puzzle) -> Result<(), Violations> {
    PuzzleInvariants::check_all(puzzle).inspect_err(|violations| {
        warn!(violations = %violations, "Puzzle invariants violated");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{BlockId, GroupId};
    use crate::puzzle::Block;
    use crate::test_support::sample_puzzle;

    #[test]
    fn test_sample_puzzle_is_valid() {
        assert!(validate_puzzle(&sample_puzzle()).is_ok());
    }

    #[test]
    fn test_blank_or_long_title_violates() {
        let mut puzzle = sample_puzzle();
        puzzle.title = "   ".to_string();
        assert!(!TitlePresent::holds(&puzzle));
        puzzle.title = "x".repeat(MAX_TITLE_CHARS + 1);
        assert!(!TitlePresent::holds(&puzzle));
    }

    #[test]
    fn test_three_groups_violate() {
        let mut puzzle = sample_puzzle();
        puzzle.groups.pop();
        let violations = validate_puzzle(&puzzle).unwrap_err();
        assert!(violations.contains(Rule::FourGroups));
    }

    #[test]
    fn test_answer_count_bounds() {
        let mut puzzle = sample_puzzle();
        puzzle.groups[0].answers.clear();
        assert!(!AnswersPerGroup::holds(&puzzle));
        puzzle.groups[0].answers = vec!["a".to_string(); MAX_ANSWERS + 1];
        assert!(!AnswersPerGroup::holds(&puzzle));
        puzzle.groups[0].answers = vec!["a".to_string(); MAX_ANSWERS];
        assert!(AnswersPerGroup::holds(&puzzle));
    }

    #[test]
    fn test_fifth_block_violates() {
        let mut puzzle = sample_puzzle();
        puzzle.groups[1]
            .blocks
            .push(Block::new(BlockId::generate(), "extra".to_string()));
        assert!(!BlocksPerGroup::holds(&puzzle));
    }

    #[test]
    fn test_duplicate_block_text_violates() {
        let mut puzzle = sample_puzzle();
        let value = puzzle.groups[0].blocks[0].value.to_uppercase();
        puzzle.groups[3].blocks[3].value = value;
        assert!(!UniqueBlocks::holds(&puzzle));
    }

    #[test]
    fn test_duplicate_ids_violate() {
        let mut puzzle = sample_puzzle();
        puzzle.groups[1].id = puzzle.groups[0].id;
        assert!(!UniqueIds::holds(&puzzle));

        let mut puzzle = sample_puzzle();
        puzzle.groups[2].blocks[0].id = puzzle.groups[0].blocks[0].id;
        assert!(!UniqueIds::holds(&puzzle));
        puzzle.groups[2].blocks[0].id = BlockId::generate();
        puzzle.groups[2].id = GroupId::generate();
        assert!(UniqueIds::holds(&puzzle));
    }

    #[test]
    fn test_override_bounds() {
        let mut puzzle = sample_puzzle();
        puzzle.time_allowed = MAX_TIME_OVERRIDE_MS + 1;
        assert!(!OverridesInRange::holds(&puzzle));
        puzzle.time_allowed = MAX_TIME_OVERRIDE_MS;
        puzzle.max_attempts = MAX_ATTEMPTS_OVERRIDE;
        assert!(OverridesInRange::holds(&puzzle));
    }
}

//! Structural invariants of a game.

use std::collections::HashSet;
use tracing::{instrument, warn};

use super::{Invariant, InvariantSet, Rule, Violations};
use crate::game::Game;
use crate::puzzle::{BLOCKS_PER_GROUP, GROUP_COUNT};

/// Highest score a game can reach: four links plus four named connections.
pub const MAX_SCORE: u8 = 8;

/// Invariant: every attempt links four distinct blocks of the puzzle.
pub struct AttemptsWellFormed;

impl Invariant<Game> for AttemptsWellFormed {
    fn holds(game: &Game) -> bool {
        let blocks: HashSet<_> = game.puzzle.block_ids().collect();
        game.attempts.iter().all(|attempt| {
            let unique: HashSet<_> = attempt.iter().collect();
            attempt.len() == BLOCKS_PER_GROUP
                && unique.len() == BLOCKS_PER_GROUP
                && attempt.iter().all(|id| blocks.contains(id))
        })
    }

    fn rule() -> Rule {
        Rule::AttemptsWellFormed
    }
}

/// Invariant: attempts never exceed a non-zero budget.
pub struct AttemptsWithinBudget;

impl Invariant<Game> for AttemptsWithinBudget {
    fn holds(game: &Game) -> bool {
        let max = usize::from(game.config.max_attempts);
        max == 0 || game.attempts.len() <= max
    }

    fn rule() -> Rule {
        Rule::AttemptsWithinBudget
    }
}

/// Invariant: correct groups are distinct groups of the puzzle.
pub struct CorrectWellFormed;

impl Invariant<Game> for CorrectWellFormed {
    fn holds(game: &Game) -> bool {
        let groups: HashSet<_> = game.puzzle.group_ids().collect();
        let unique: HashSet<_> = game.correct.iter().collect();
        game.correct.len() <= GROUP_COUNT
            && unique.len() == game.correct.len()
            && game.correct.iter().all(|id| groups.contains(id))
    }

    fn rule() -> Rule {
        Rule::CorrectWellFormed
    }
}

/// Invariant: score is at most [`MAX_SCORE`].
pub struct ScoreInRange;

impl Invariant<Game> for ScoreInRange {
    fn holds(game: &Game) -> bool {
        game.score <= MAX_SCORE
    }

    fn rule() -> Rule {
        Rule::ScoreInRange
    }
}

/// Invariant: score is what the game state earns.
///
/// - before guessing nothing is scored
/// - after guessing the score is the number of correct groups
/// - once complete, correct connection guesses add one point each
pub struct ScoreMatchesCorrect;

impl Invariant<Game> for ScoreMatchesCorrect {
    fn holds(game: &Game) -> bool {
        let linked = game.correct.len();
        let named = game.results.iter().filter(|r| r.correct).count();
        let score = usize::from(game.score);

        if !game.is_guessed() {
            score == 0 && linked == 0
        } else if !game.is_complete() {
            score == linked
        } else {
            score == linked + named
        }
    }

    fn rule() -> Rule {
        Rule::ScoreMatchesCorrect
    }
}

/// Invariant: started and guessed times are set together.
pub struct TimestampsPaired;

impl Invariant<Game> for TimestampsPaired {
    fn holds(game: &Game) -> bool {
        game.started_at.is_some() == game.guessed_at.is_some()
    }

    fn rule() -> Rule {
        Rule::TimestampsPaired
    }
}

/// Invariant: created ≤ started ≤ guessed ≤ completed, and completion
/// requires a closed linking phase.
pub struct TimestampsOrdered;

impl Invariant<Game> for TimestampsOrdered {
    fn holds(game: &Game) -> bool {
        let started_ok = game.started_at.is_none_or(|s| s >= game.created_at);
        let guessed_ok = match (game.started_at, game.guessed_at) {
            (Some(s), Some(g)) => g >= s,
            _ => true,
        };
        let completed_ok = match (game.guessed_at, game.completed_at) {
            (_, None) => true,
            (Some(g), Some(c)) => c >= g,
            (None, Some(_)) => false,
        };
        started_ok && guessed_ok && completed_ok
    }

    fn rule() -> Rule {
        Rule::TimestampsOrdered
    }
}

/// Invariant: no results before completion, one per group after.
pub struct ResultsWellFormed;

impl Invariant<Game> for ResultsWellFormed {
    fn holds(game: &Game) -> bool {
        if !game.is_complete() {
            return game.results.is_empty();
        }
        let groups: HashSet<_> = game.puzzle.group_ids().collect();
        let answered: HashSet<_> = game.results.iter().map(|r| r.puzzle_group_id).collect();
        game.results.len() == groups.len() && answered == groups
    }

    fn rule() -> Rule {
        Rule::ResultsWellFormed
    }
}

/// Invariant: config fields locked by the puzzle carry the puzzle's values.
pub struct ConfigHonoursLocks;

impl Invariant<Game> for ConfigHonoursLocks {
    fn holds(game: &Game) -> bool {
        let puzzle = &game.puzzle;
        (!puzzle.locks_max_attempts() || game.config.max_attempts == puzzle.max_attempts)
            && (!puzzle.locks_time_allowed() || game.config.time_allowed == puzzle.time_allowed)
    }

    fn rule() -> Rule {
        Rule::ConfigHonoursLocks
    }
}

/// All game invariants as a composable set.
pub type GameInvariants = (
    AttemptsWellFormed,
    AttemptsWithinBudget,
    CorrectWellFormed,
    ScoreInRange,
    ScoreMatchesCorrect,
    TimestampsPaired,
    TimestampsOrdered,
    ResultsWellFormed,
    ConfigHonoursLocks,
);

/// Checks every game invariant.
///
/// # Errors
///
/// Returns the violated rules, in check order.
#[instrument(skip(game), fields(game_id = %game.id))]
pub fn validate_game(game: &Game) -> Result<(), Violations> {
    GameInvariants::check_all(game).inspect_err(|violations| {
        warn!(violations = %violations, "Game invariants violated");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameResult;
    use crate::test_support::{sample_game, sample_puzzle};
    use chrono::Duration;

    #[test]
    fn test_new_game_is_valid() {
        assert!(validate_game(&sample_game()).is_ok());
    }

    #[test]
    fn test_attempt_with_three_blocks_violates() {
        let mut game = sample_game();
        let blocks: Vec<_> = game.puzzle.block_ids().take(3).collect();
        game.attempts.push(blocks);
        assert!(!AttemptsWellFormed::holds(&game));
    }

    #[test]
    fn test_attempt_with_repeated_block_violates() {
        let mut game = sample_game();
        let first = game.puzzle.block_ids().next().unwrap();
        game.attempts.push(vec![first; 4]);
        assert!(!AttemptsWellFormed::holds(&game));
    }

    #[test]
    fn test_attempt_with_foreign_block_violates() {
        let mut game = sample_game();
        let foreign = sample_puzzle().block_ids().take(4).collect();
        game.attempts.push(foreign);
        assert!(!AttemptsWellFormed::holds(&game));
    }

    #[test]
    fn test_attempt_budget() {
        let mut game = sample_game();
        game.config.max_attempts = 1;
        let attempt: Vec<_> = game.puzzle.block_ids().take(4).collect();
        game.attempts = vec![attempt.clone()];
        assert!(AttemptsWithinBudget::holds(&game));
        game.attempts.push(attempt.clone());
        assert!(!AttemptsWithinBudget::holds(&game));
        game.config.max_attempts = 0;
        assert!(AttemptsWithinBudget::holds(&game));
    }

    #[test]
    fn test_duplicate_correct_group_violates() {
        let mut game = sample_game();
        let group = game.puzzle.groups[0].id;
        game.correct = vec![group, group];
        assert!(!CorrectWellFormed::holds(&game));
    }

    #[test]
    fn test_unguessed_game_cannot_score() {
        let mut game = sample_game();
        game.score = 1;
        assert!(!ScoreMatchesCorrect::holds(&game));
    }

    #[test]
    fn test_completed_score_counts_named_connections() {
        let mut game = sample_game();
        let start = game.created_at + Duration::seconds(1);
        game.started_at = Some(start);
        game.guessed_at = Some(start);
        game.completed_at = Some(start);
        game.correct = vec![game.puzzle.groups[0].id];
        game.results = game
            .puzzle
            .groups
            .iter()
            .enumerate()
            .map(|(i, g)| GameResult::new(g.id, "x".to_string(), i < 2))
            .collect();
        game.score = 3;
        assert!(ScoreMatchesCorrect::holds(&game));
        assert!(ResultsWellFormed::holds(&game));
        game.score = 1;
        assert!(!ScoreMatchesCorrect::holds(&game));
    }

    #[test]
    fn test_unpaired_times_violate() {
        let mut game = sample_game();
        game.started_at = Some(game.created_at);
        let violations = validate_game(&game).unwrap_err();
        assert!(violations.contains(Rule::TimestampsPaired));
    }

    #[test]
    fn test_backwards_times_violate() {
        let mut game = sample_game();
        game.started_at = Some(game.created_at + Duration::seconds(10));
        game.guessed_at = Some(game.created_at + Duration::seconds(5));
        assert!(!TimestampsOrdered::holds(&game));
    }

    #[test]
    fn test_completion_without_guess_violates() {
        let mut game = sample_game();
        game.completed_at = Some(game.created_at);
        assert!(!TimestampsOrdered::holds(&game));
    }

    #[test]
    fn test_results_before_completion_violate() {
        let mut game = sample_game();
        let group = game.puzzle.groups[0].id;
        game.results.push(GameResult::new(group, "x".to_string(), false));
        assert!(!ResultsWellFormed::holds(&game));
    }

    #[test]
    fn test_locked_config_must_match_puzzle() {
        let mut game = sample_game();
        game.puzzle.max_attempts = 5;
        game.config.max_attempts = 24;
        assert!(!ConfigHonoursLocks::holds(&game));
        game.config.max_attempts = 5;
        assert!(ConfigHonoursLocks::holds(&game));
    }
}

//! Game construction and the two transitions: Guess, then Complete.
//!
//! Each transition is a contract in the Hoare style:
//! - Precondition: {P(stored, update)} checked before the candidate is built
//! - Postcondition: {Q(stored, candidate)} checked on the stripped candidate
//!
//! Both run inside the [`UpdateGate`], which contributes the shared identity,
//! terminal and ownership checks and the final invariant validation.

use chrono::Utc;
use tracing::{info, instrument, warn};

use super::{Config, Game, GameError, GameUpdate};
use crate::Error;
use crate::ids::{ChallengeCode, GameId, UserRef};
use crate::puzzle::Puzzle;
use crate::sanitize::Sanitizer;
use crate::validation::{
    AttemptsWellFormed, AttemptsWithinBudget, CorrectWellFormed, Guarded, Invariant, MAX_SCORE,
    ResultsWellFormed, UpdateGate, Violations, validate_game,
};

// ─────────────────────────────────────────────────────────────
//  Construction
// ─────────────────────────────────────────────────────────────

impl Game {
    /// Creates a fresh game of `puzzle` for `user`.
    ///
    /// The budget follows the puzzle's difficulty unless the puzzle
    /// overrides it, in which case the override is locked for the life of
    /// the game.
    #[instrument(skip(puzzle), fields(puzzle_id = %puzzle.id))]
    pub fn new(puzzle: Puzzle, user: Option<UserRef>) -> Self {
        Self {
            id: GameId::generate(),
            score: 0,
            attempts: Vec::new(),
            correct: Vec::new(),
            config: Config::for_puzzle(&puzzle),
            results: Vec::new(),
            challenge_code: ChallengeCode::generate(),
            created_at: Utc::now(),
            started_at: None,
            guessed_at: None,
            completed_at: None,
            challenged_by: None,
            puzzle,
            user,
        }
    }
}

// ─────────────────────────────────────────────────────────────
//  Gate integration
// ─────────────────────────────────────────────────────────────

impl Guarded for Game {
    type Id = GameId;
    type Update = GameUpdate;

    fn guard_id(&self) -> GameId {
        self.id
    }

    fn update_id(update: &GameUpdate) -> GameId {
        update.id
    }

    fn is_terminal(&self) -> bool {
        self.is_complete()
    }

    fn owner(&self) -> Option<&UserRef> {
        self.user.as_ref()
    }

    fn check(&self) -> Result<(), Violations> {
        validate_game(self)
    }

    fn strip(&self, update: GameUpdate) -> Self {
        Self {
            id: self.id,
            score: update.score,
            attempts: update.attempts.unwrap_or_else(|| self.attempts.clone()),
            correct: update.correct,
            config: self.config,
            results: update.results,
            challenge_code: self.challenge_code.clone(),
            created_at: self.created_at,
            started_at: update.started_at,
            guessed_at: update.guessed_at,
            completed_at: update.completed_at,
            challenged_by: self.challenged_by.clone(),
            puzzle: self.puzzle.clone(),
            user: self.user.clone(),
        }
    }
}

// ─────────────────────────────────────────────────────────────
//  Contracts
// ─────────────────────────────────────────────────────────────

/// Preconditions and postconditions of a state transition.
pub trait Contract<S, A> {
    /// Checks the proposal against the stored state.
    fn pre(state: &S, action: &A) -> Result<(), GameError>;

    /// Checks the candidate produced from the proposal.
    fn post(before: &S, after: &S) -> Result<(), GameError>;
}

/// Contract of the Guess transition.
///
/// Preconditions:
/// - the linking phase is still open
/// - both phase times are supplied, in order
/// - the score is at most four
///
/// Postconditions:
/// - score equals the number of correct groups
/// - correct groups and attempts are well formed
/// - attempts and elapsed time fit the budget
pub struct GuessContract;

impl Contract<Game, GameUpdate> for GuessContract {
    fn pre(game: &Game, update: &GameUpdate) -> Result<(), GameError> {
        if game.started_at.is_some() || game.guessed_at.is_some() {
            return Err(GameError::AlreadyGuessed);
        }
        let (Some(started), Some(guessed)) = (update.started_at, update.guessed_at) else {
            return Err(GameError::TimesRequired);
        };
        if guessed < started {
            return Err(GameError::GuessedBeforeStarted);
        }
        if update.score > MAX_SCORE / 2 {
            return Err(GameError::InvalidScore(update.score));
        }
        Ok(())
    }

    fn post(_before: &Game, after: &Game) -> Result<(), GameError> {
        if usize::from(after.score) != after.correct.len() {
            return Err(GameError::ScoreMismatch {
                score: after.score,
                correct: after.correct.len(),
            });
        }
        if !CorrectWellFormed::holds(after) {
            return Err(GameError::InvalidCorrect);
        }
        if !AttemptsWellFormed::holds(after) {
            return Err(GameError::InvalidAttempt);
        }
        if !AttemptsWithinBudget::holds(after) {
            return Err(GameError::TooManyAttempts {
                attempts: after.attempts.len(),
                max: after.config.max_attempts,
            });
        }
        if let (Some(started), Some(guessed)) = (after.started_at, after.guessed_at) {
            let elapsed_ms = (guessed - started).num_milliseconds();
            let allowed_ms = after.config.time_allowed;
            if allowed_ms != 0 && elapsed_ms > i64::from(allowed_ms) {
                return Err(GameError::TimeExceeded {
                    elapsed_ms,
                    allowed_ms,
                });
            }
        }
        Ok(())
    }
}

/// Contract of the Complete transition.
///
/// Preconditions:
/// - the linking phase has closed
/// - a completion time no earlier than the guess is supplied
///
/// Postconditions:
/// - results name every group of the puzzle exactly once
pub struct CompleteContract;

impl Contract<Game, GameUpdate> for CompleteContract {
    fn pre(game: &Game, update: &GameUpdate) -> Result<(), GameError> {
        let Some(guessed) = game.guessed_at.filter(|_| game.started_at.is_some()) else {
            return Err(GameError::NotStarted);
        };
        let Some(completed) = update.completed_at else {
            return Err(GameError::CompletionTimeRequired);
        };
        if completed < guessed {
            return Err(GameError::CompletedBeforeGuessed);
        }
        Ok(())
    }

    fn post(_before: &Game, after: &Game) -> Result<(), GameError> {
        if !ResultsWellFormed::holds(after) {
            return Err(GameError::InvalidResults);
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────
//  Transitions
// ─────────────────────────────────────────────────────────────

impl Game {
    /// Closes the linking phase.
    ///
    /// Returns the candidate game; nothing is persisted. Results and the
    /// completion time keep their stored values.
    ///
    /// # Errors
    ///
    /// Returns a gate error for identity, terminal, ownership or invariant
    /// failures and a [`GameError`] for every violated precondition.
    #[instrument(skip(self, update, actor), fields(game_id = %self.id))]
    pub fn guess(&self, update: GameUpdate, actor: Option<&UserRef>) -> Result<Game, Error> {
        let gate = UpdateGate::new(self, actor);
        gate.admit(&update)?;
        GuessContract::pre(self, &update).inspect_err(|err| warn!(%err, "Guess rejected"))?;

        let mut candidate = gate.strip(update);
        candidate.results = self.results.clone();
        candidate.completed_at = self.completed_at;

        GuessContract::post(self, &candidate).inspect_err(|err| warn!(%err, "Guess rejected"))?;
        let candidate = gate.commit(candidate)?;
        info!(score = candidate.score, attempts = candidate.attempts.len(), "Game guessed");
        Ok(candidate)
    }

    /// Records the connection guesses and ends the game.
    ///
    /// Only the results and the completion time are taken from `update`.
    /// Each guess is sanitized and scored against the group's answers; the
    /// final score is the number of linked groups plus the number of named
    /// connections.
    ///
    /// # Errors
    ///
    /// Same classes as [`Game::guess`].
    #[instrument(skip(self, update, actor, sanitizer), fields(game_id = %self.id))]
    pub fn complete(
        &self,
        update: GameUpdate,
        actor: Option<&UserRef>,
        sanitizer: &dyn Sanitizer,
    ) -> Result<Game, Error> {
        let gate = UpdateGate::new(self, actor);
        gate.admit(&update)?;
        CompleteContract::pre(self, &update)
            .inspect_err(|err| warn!(%err, "Completion rejected"))?;

        let mut candidate = gate.strip(update);
        candidate.attempts = self.attempts.clone();
        candidate.correct = self.correct.clone();
        candidate.started_at = self.started_at;
        candidate.guessed_at = self.guessed_at;
        candidate.score_results(sanitizer);

        CompleteContract::post(self, &candidate)
            .inspect_err(|err| warn!(%err, "Completion rejected"))?;
        let candidate = gate.commit(candidate)?;
        info!(score = candidate.score, "Game completed");
        Ok(candidate)
    }

    fn score_results(&mut self, sanitizer: &dyn Sanitizer) {
        for result in &mut self.results {
            result.guess = sanitizer.sanitize(&result.guess);
            result.correct = self
                .puzzle
                .group(result.puzzle_group_id)
                .is_some_and(|group| group.accepts(&result.guess));
        }
        let named = self.results.iter().filter(|r| r.correct).count();
        self.score = u8::try_from(self.correct.len() + named).unwrap_or(u8::MAX);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameResult;
    use crate::ids::GroupId;
    use crate::puzzle::Difficulty;
    use crate::sanitize::TextSanitizer;
    use crate::test_support::{player, sample_game, sample_puzzle};
    use crate::validation::GateError;
    use chrono::{DateTime, Duration};

    fn times(game: &Game, start_ms: i64, end_ms: i64) -> (DateTime<Utc>, DateTime<Utc>) {
        (
            game.created_at + Duration::milliseconds(start_ms),
            game.created_at + Duration::milliseconds(end_ms),
        )
    }

    fn guess_update(game: &Game, linked: usize) -> GameUpdate {
        let (started, guessed) = times(game, 0, 1_000);
        let mut update = GameUpdate::new(game.id);
        update.started_at = Some(started);
        update.guessed_at = Some(guessed);
        update.correct = game.puzzle.group_ids().take(linked).collect();
        update.score = linked as u8;
        update
    }

    fn guessed(game: &Game, linked: usize) -> Game {
        game.guess(guess_update(game, linked), Some(&player())).unwrap()
    }

    fn results_for(game: &Game, named: usize) -> Vec<GameResult> {
        game.puzzle
            .groups
            .iter()
            .enumerate()
            .map(|(i, group)| {
                let guess = if i < named {
                    group.answers[0].to_uppercase()
                } else {
                    "no idea".to_string()
                };
                GameResult::new(group.id, guess, false)
            })
            .collect()
    }

    fn complete_update(game: &Game, named: usize) -> GameUpdate {
        let mut update = GameUpdate::new(game.id);
        update.completed_at = game.guessed_at.map(|g| g + Duration::seconds(4));
        update.results = results_for(game, named);
        update
    }

    fn gate_err(err: Error) -> GateError {
        match err {
            Error::Gate(gate) => gate,
            other => panic!("expected gate error, got {other:?}"),
        }
    }

    fn game_err(err: Error) -> GameError {
        match err {
            Error::Game(game) => game,
            other => panic!("expected game error, got {other:?}"),
        }
    }

    #[test]
    fn test_config_follows_difficulty() {
        for (difficulty, attempts, time) in [
            (Difficulty::Easy, 24, 600_000),
            (Difficulty::Medium, 18, 300_000),
            (Difficulty::Hard, 12, 180_000),
        ] {
            let mut puzzle = sample_puzzle();
            puzzle.difficulty = difficulty;
            let game = Game::new(puzzle, None);
            assert_eq!(game.config, Config::new(attempts, time));
        }
    }

    #[test]
    fn test_override_wins_over_difficulty() {
        let mut puzzle = sample_puzzle();
        puzzle.difficulty = Difficulty::Hard;
        puzzle.time_allowed = 42_000;
        let game = Game::new(puzzle, None);
        assert_eq!(game.config, Config::new(12, 42_000));
        assert!(validate_game(&game).is_ok());
    }

    #[test]
    fn test_guess_records_phase() {
        let game = sample_game();
        let after = guessed(&game, 2);
        assert_eq!(after.score, 2);
        assert_eq!(after.correct.len(), 2);
        assert!(after.is_guessed());
        assert!(!after.is_complete());
    }

    #[test]
    fn test_guess_requires_both_times() {
        let game = sample_game();
        let mut update = guess_update(&game, 0);
        update.guessed_at = None;
        let err = game.guess(update, Some(&player())).unwrap_err();
        assert_eq!(game_err(err), GameError::TimesRequired);

        let mut update = guess_update(&game, 0);
        update.started_at = None;
        let err = game.guess(update, Some(&player())).unwrap_err();
        assert_eq!(game_err(err), GameError::TimesRequired);
    }

    #[test]
    fn test_guess_rejects_score_mismatch() {
        let game = sample_game();
        let mut update = guess_update(&game, 2);
        update.score = 3;
        let err = game.guess(update, Some(&player())).unwrap_err();
        assert_eq!(
            game_err(err),
            GameError::ScoreMismatch {
                score: 3,
                correct: 2
            }
        );
    }

    #[test]
    fn test_guess_rejects_score_above_four() {
        let game = sample_game();
        let mut update = guess_update(&game, 4);
        update.score = 5;
        let err = game.guess(update, Some(&player())).unwrap_err();
        assert_eq!(game_err(err), GameError::InvalidScore(5));
    }

    #[test]
    fn test_guess_rejects_malformed_attempts() {
        let game = sample_game();
        for size in [3, 5] {
            let mut update = guess_update(&game, 0);
            update.attempts = Some(vec![game.puzzle.block_ids().take(size).collect()]);
            let err = game.guess(update, Some(&player())).unwrap_err();
            assert_eq!(game_err(err), GameError::InvalidAttempt);
        }
    }

    #[test]
    fn test_guess_rejects_foreign_group() {
        let game = sample_game();
        let mut update = guess_update(&game, 0);
        update.correct = vec![GroupId::generate()];
        update.score = 1;
        let err = game.guess(update, Some(&player())).unwrap_err();
        assert_eq!(game_err(err), GameError::InvalidCorrect);
    }

    #[test]
    fn test_guess_rejects_attempts_over_budget() {
        let mut puzzle = sample_puzzle();
        puzzle.max_attempts = 1;
        let game = Game::new(puzzle, Some(player()));
        let attempt: Vec<_> = game.puzzle.block_ids().take(4).collect();
        let mut update = guess_update(&game, 0);
        update.attempts = Some(vec![attempt.clone(), attempt]);
        let err = game.guess(update, Some(&player())).unwrap_err();
        assert_eq!(
            game_err(err),
            GameError::TooManyAttempts {
                attempts: 2,
                max: 1
            }
        );
    }

    #[test]
    fn test_guess_rejects_overtime() {
        let mut puzzle = sample_puzzle();
        puzzle.time_allowed = 500;
        let game = Game::new(puzzle, Some(player()));
        let err = game
            .guess(guess_update(&game, 1), Some(&player()))
            .unwrap_err();
        assert_eq!(
            game_err(err),
            GameError::TimeExceeded {
                elapsed_ms: 1_000,
                allowed_ms: 500
            }
        );
    }

    #[test]
    fn test_guess_keeps_stored_config() {
        let mut puzzle = sample_puzzle();
        puzzle.max_attempts = 6;
        let game = Game::new(puzzle, Some(player()));
        let mut update = serde_json::to_value(guess_update(&game, 0)).unwrap();
        update["config"] = serde_json::json!({ "maxAttempts": 0, "timeAllowed": 0 });
        let update: GameUpdate = serde_json::from_value(update).unwrap();
        let after = game.guess(update, Some(&player())).unwrap();
        assert_eq!(after.config, game.config);
    }

    #[test]
    fn test_challenged_guess_cannot_lift_budget() {
        let mut puzzle = sample_puzzle();
        puzzle.difficulty = Difficulty::Hard;
        let root = Game::new(puzzle, Some(player()));
        let game = Game::challenge(&root, Some(player()));
        assert_eq!(game.config, Config::new(12, 180_000));

        let mut update = serde_json::to_value(guess_update(&game, 0)).unwrap();
        update["guessedAt"] = serde_json::json!(game.created_at + Duration::hours(10));
        update["config"] = serde_json::json!({ "maxAttempts": 0, "timeAllowed": 0 });
        let update: GameUpdate = serde_json::from_value(update).unwrap();
        let err = game.guess(update, Some(&player())).unwrap_err();
        assert_eq!(
            game_err(err),
            GameError::TimeExceeded {
                elapsed_ms: 36_000_000,
                allowed_ms: 180_000
            }
        );
    }

    #[test]
    fn test_complete_keeps_stored_config() {
        let game = guessed(&sample_game(), 1);
        let mut update = serde_json::to_value(complete_update(&game, 1)).unwrap();
        update["config"] = serde_json::json!({ "maxAttempts": 1, "timeAllowed": 1 });
        let update: GameUpdate = serde_json::from_value(update).unwrap();
        let after = game
            .complete(update, Some(&player()), &TextSanitizer::default())
            .unwrap();
        assert_eq!(after.config, game.config);
    }

    #[test]
    fn test_guess_forces_results_and_completion() {
        let game = sample_game();
        let mut update = guess_update(&game, 1);
        update.results = results_for(&game, 4);
        update.completed_at = update.guessed_at;
        let after = game.guess(update, Some(&player())).unwrap();
        assert!(after.results.is_empty());
        assert!(after.completed_at.is_none());
    }

    #[test]
    fn test_second_guess_rejected() {
        let game = guessed(&sample_game(), 1);
        let err = game
            .guess(guess_update(&game, 1), Some(&player()))
            .unwrap_err();
        assert_eq!(game_err(err), GameError::AlreadyGuessed);
    }

    #[test]
    fn test_non_owner_sees_not_found() {
        let game = sample_game();
        let stranger = UserRef::new("stranger", "Stranger");
        let err = game
            .guess(guess_update(&game, 0), Some(&stranger))
            .unwrap_err();
        assert_eq!(gate_err(err), GateError::NotFound);
        let err = game.guess(guess_update(&game, 0), None).unwrap_err();
        assert_eq!(gate_err(err), GateError::NotFound);
    }

    #[test]
    fn test_complete_requires_guess() {
        let game = sample_game();
        let mut update = GameUpdate::new(game.id);
        update.completed_at = Some(game.created_at);
        update.results = results_for(&game, 0);
        let err = game
            .complete(update, Some(&player()), &TextSanitizer::default())
            .unwrap_err();
        assert_eq!(game_err(err), GameError::NotStarted);
    }

    #[test]
    fn test_complete_rejects_foreign_results() {
        let game = guessed(&sample_game(), 1);
        let mut update = complete_update(&game, 0);
        update.results[0].puzzle_group_id = GroupId::generate();
        let err = game
            .complete(update, Some(&player()), &TextSanitizer::default())
            .unwrap_err();
        assert_eq!(game_err(err), GameError::InvalidResults);
    }

    #[test]
    fn test_complete_rejects_duplicate_and_missing_results() {
        let game = guessed(&sample_game(), 1);
        let mut update = complete_update(&game, 0);
        update.results[1].puzzle_group_id = update.results[0].puzzle_group_id;
        let err = game
            .complete(update, Some(&player()), &TextSanitizer::default())
            .unwrap_err();
        assert_eq!(game_err(err), GameError::InvalidResults);

        let mut update = complete_update(&game, 0);
        update.results.pop();
        let err = game
            .complete(update, Some(&player()), &TextSanitizer::default())
            .unwrap_err();
        assert_eq!(game_err(err), GameError::InvalidResults);
    }

    #[test]
    fn test_complete_rejects_early_completion() {
        let game = guessed(&sample_game(), 1);
        let mut update = complete_update(&game, 0);
        update.completed_at = game.started_at;
        let err = game
            .complete(update, Some(&player()), &TextSanitizer::default())
            .unwrap_err();
        assert_eq!(game_err(err), GameError::CompletedBeforeGuessed);
    }

    #[test]
    fn test_complete_scores_named_connections() {
        let game = guessed(&sample_game(), 2);
        let mut update = complete_update(&game, 3);
        update.score = 0;
        update.correct = Vec::new();
        update.attempts = Some(Vec::new());
        let after = game
            .complete(update, Some(&player()), &TextSanitizer::default())
            .unwrap();
        assert_eq!(after.score, 5);
        assert_eq!(after.correct, game.correct);
        assert_eq!(after.results.iter().filter(|r| r.correct).count(), 3);
        assert_eq!(after.guessed_at, game.guessed_at);
    }

    #[test]
    fn test_complete_ignores_client_correct_flags() {
        let game = guessed(&sample_game(), 0);
        let mut update = complete_update(&game, 0);
        for result in &mut update.results {
            result.correct = true;
        }
        let after = game
            .complete(update, Some(&player()), &TextSanitizer::default())
            .unwrap();
        assert_eq!(after.score, 0);
        assert!(after.results.iter().all(|r| !r.correct));
    }

    #[test]
    fn test_completed_game_is_terminal() {
        let game = guessed(&sample_game(), 1);
        let done = game
            .complete(complete_update(&game, 1), Some(&player()), &TextSanitizer::default())
            .unwrap();
        let err = done
            .guess(guess_update(&done, 1), Some(&player()))
            .unwrap_err();
        assert_eq!(gate_err(err), GateError::AlreadyComplete);
        let err = done
            .complete(complete_update(&done, 1), Some(&player()), &TextSanitizer::default())
            .unwrap_err();
        assert_eq!(gate_err(err).to_string(), "already complete");
    }

    #[test]
    fn test_update_for_other_game_rejected() {
        let game = sample_game();
        let mut update = guess_update(&game, 0);
        update.id = GameId::generate();
        let err = game.guess(update, Some(&player())).unwrap_err();
        assert!(matches!(gate_err(err), GateError::IdMismatch(_, _)));
    }
}

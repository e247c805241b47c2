//! Game operations over a repository.

use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::{Game, GameError, GameNode, GameUpdate};
use crate::Error;
use crate::ids::{ChallengeCode, GameId, UserId, UserRef};
use crate::pagination::{Connection, GameSortKey, ListParams, PageRequest, build_connection};
use crate::puzzle::Puzzle;
use crate::repository::{GameRepository, RepositoryError};
use crate::sanitize::Sanitizer;
use crate::validation::{GateError, validate_game};

/// Creates, finds and advances games.
#[derive(Clone)]
pub struct GameService {
    games: Arc<dyn GameRepository>,
    sanitizer: Arc<dyn Sanitizer>,
}

impl std::fmt::Debug for GameService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameService").finish_non_exhaustive()
    }
}

impl GameService {
    /// Creates a service over `games`, cleaning player text with `sanitizer`.
    pub fn new(games: Arc<dyn GameRepository>, sanitizer: Arc<dyn Sanitizer>) -> Self {
        Self { games, sanitizer }
    }

    /// Starts a new game of `puzzle`.
    ///
    /// # Errors
    ///
    /// Fails if the new game breaks an invariant or cannot be stored.
    #[instrument(skip(self, puzzle), fields(puzzle_id = %puzzle.id))]
    pub fn create(&self, puzzle: Puzzle, user: Option<UserRef>) -> Result<Game, Error> {
        let game = Game::new(puzzle, user);
        self.insert(game)
    }

    /// Loads a game.
    ///
    /// # Errors
    ///
    /// Returns a not-found repository error for unknown ids.
    #[instrument(skip(self))]
    pub fn find(&self, id: GameId, viewer: Option<&UserRef>) -> Result<Game, Error> {
        let game = self.games.get(id, viewer)?;
        debug!(game_id = %game.id, "Game loaded");
        Ok(game)
    }

    /// Applies the Guess transition to game `id`.
    ///
    /// # Errors
    ///
    /// Any rejection of [`Game::guess`], or
    /// [`GameError::ConcurrentUpdate`] if another request guessed first.
    #[instrument(skip(self, update, actor))]
    pub fn guess(
        &self,
        id: GameId,
        update: GameUpdate,
        actor: Option<&UserRef>,
    ) -> Result<Game, Error> {
        let stored = self.games.get(id, actor)?;
        let candidate = stored.guess(update, actor)?;
        self.save(candidate)
    }

    /// Applies the Complete transition to game `id`.
    ///
    /// # Errors
    ///
    /// Any rejection of [`Game::complete`], or
    /// [`GameError::ConcurrentUpdate`] if another request completed first.
    #[instrument(skip(self, update, actor))]
    pub fn complete(
        &self,
        id: GameId,
        update: GameUpdate,
        actor: Option<&UserRef>,
    ) -> Result<Game, Error> {
        let stored = self.games.get(id, actor)?;
        let candidate = stored.complete(update, actor, self.sanitizer.as_ref())?;
        self.save(candidate)
    }

    /// Starts a game replaying the one identified by `code`.
    ///
    /// # Errors
    ///
    /// Returns a not-found repository error for unknown codes.
    #[instrument(skip(self, code, user), fields(code = %code))]
    pub fn challenge(&self, code: &ChallengeCode, user: Option<UserRef>) -> Result<Game, Error> {
        let ancestor = self.games.get_with_challenge_code(code, user.as_ref())?;
        let game = Game::challenge(&ancestor, user);
        self.insert(game)
    }

    /// Completed games of `for_user`, one page at a time.
    ///
    /// # Errors
    ///
    /// Pagination errors for invalid requests, [`Error::ListFetch`] if the
    /// page cannot be assembled.
    #[instrument(skip(self, for_user, viewer), fields(for_user = %for_user))]
    pub fn played(
        &self,
        request: &PageRequest,
        for_user: &UserId,
        viewer: Option<&UserRef>,
    ) -> Result<Connection<GameNode>, Error> {
        let params = ListParams::<GameSortKey>::parse(request)?;
        let rows = self.games.get_played(&params, for_user, viewer)?;
        debug!(rows = rows.len(), "Played games fetched");
        build_connection(rows, params.limit, params.key_name()).map_err(Error::ListFetch)
    }

    fn insert(&self, game: Game) -> Result<Game, Error> {
        validate_game(&game).map_err(GateError::Invalid)?;
        let game = self.games.create(game)?;
        info!(game_id = %game.id, challenge_code = %game.challenge_code, "Game created");
        Ok(game)
    }

    fn save(&self, candidate: Game) -> Result<Game, Error> {
        let game = self.games.update(candidate).map_err(|err: RepositoryError| {
            if err.is_conflict() {
                warn!(error = %err, "Lost update race");
                Error::Game(GameError::ConcurrentUpdate)
            } else {
                Error::Repository(err)
            }
        })?;
        info!(game_id = %game.id, score = game.score, "Game saved");
        Ok(game)
    }
}

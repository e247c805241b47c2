//! Puzzle operations over a repository.

use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::{NewPuzzle, Puzzle, PuzzleError, PuzzleNode, PuzzleUpdate};
use crate::Error;
use crate::ids::{PuzzleId, UserRef, same_owner};
use crate::pagination::{Connection, ListParams, PageRequest, PuzzleSortKey, build_connection};
use crate::repository::PuzzleRepository;
use crate::sanitize::Sanitizer;
use crate::validation::validate_puzzle;

/// Publishes, edits, lists and likes puzzles.
#[derive(Clone)]
pub struct PuzzleService {
    puzzles: Arc<dyn PuzzleRepository>,
    sanitizer: Arc<dyn Sanitizer>,
}

impl std::fmt::Debug for PuzzleService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PuzzleService").finish_non_exhaustive()
    }
}

impl PuzzleService {
    /// Creates a service over `puzzles`, cleaning author text with
    /// `sanitizer`.
    pub fn new(puzzles: Arc<dyn PuzzleRepository>, sanitizer: Arc<dyn Sanitizer>) -> Self {
        Self { puzzles, sanitizer }
    }

    /// Publishes a puzzle written by `user`.
    ///
    /// # Errors
    ///
    /// [`PuzzleError::LoginRequired`] for anonymous authors and
    /// [`PuzzleError::Invalid`] when the submission breaks a rule.
    #[instrument(skip(self, new, user), fields(title = %new.title))]
    pub fn create(&self, new: NewPuzzle, user: Option<UserRef>) -> Result<Puzzle, Error> {
        let Some(user) = user else {
            warn!("Anonymous puzzle submission");
            return Err(PuzzleError::LoginRequired.into());
        };
        let puzzle = Puzzle::author(new, user, self.sanitizer.as_ref());
        validate_puzzle(&puzzle).map_err(PuzzleError::Invalid)?;
        let puzzle = self.puzzles.create(puzzle)?;
        info!(puzzle_id = %puzzle.id, "Puzzle created");
        Ok(puzzle)
    }

    /// Loads a puzzle as seen by `viewer`.
    ///
    /// # Errors
    ///
    /// Returns a not-found repository error for unknown ids.
    #[instrument(skip(self, viewer))]
    pub fn get(&self, id: PuzzleId, viewer: Option<&UserRef>) -> Result<Puzzle, Error> {
        let puzzle = self.puzzles.get(id, viewer)?;
        debug!(liked = puzzle.liked, "Puzzle loaded");
        Ok(puzzle)
    }

    /// Revises puzzle `id` on behalf of its author.
    ///
    /// # Errors
    ///
    /// See [`Puzzle::revise`].
    #[instrument(skip(self, update, actor))]
    pub fn update(
        &self,
        id: PuzzleId,
        update: PuzzleUpdate,
        actor: Option<&UserRef>,
    ) -> Result<Puzzle, Error> {
        let stored = self.puzzles.get(id, actor)?;
        let played = self.puzzles.is_played(id)?;
        let candidate = stored.revise(update, actor, played, self.sanitizer.as_ref())?;
        let puzzle = self.puzzles.update(candidate)?;
        info!(played, "Puzzle updated");
        Ok(puzzle)
    }

    /// Lists puzzles, one page at a time.
    ///
    /// # Errors
    ///
    /// Pagination errors for invalid requests, [`Error::ListFetch`] if the
    /// page cannot be assembled.
    #[instrument(skip(self, viewer))]
    pub fn list(
        &self,
        request: &PageRequest,
        viewer: Option<&UserRef>,
    ) -> Result<Connection<PuzzleNode>, Error> {
        let params = ListParams::<PuzzleSortKey>::parse(request)?;
        let rows = self.puzzles.list(&params, viewer)?;
        debug!(rows = rows.len(), "Puzzles fetched");
        build_connection(rows, params.limit, params.key_name()).map_err(Error::ListFetch)
    }

    /// Records that `user` likes puzzle `id`.
    ///
    /// # Errors
    ///
    /// [`PuzzleError::LoginRequired`] for anonymous users,
    /// [`PuzzleError::OwnPuzzle`] for the author and
    /// [`PuzzleError::AlreadyLiked`] for a repeat.
    #[instrument(skip(self, user))]
    pub fn like(&self, id: PuzzleId, user: Option<&UserRef>) -> Result<Puzzle, Error> {
        let Some(user) = user else {
            warn!("Anonymous like");
            return Err(PuzzleError::LoginRequired.into());
        };
        let puzzle = self.puzzles.get(id, Some(user))?;
        if same_owner(puzzle.user.as_ref(), Some(user)) {
            warn!(user = %user.id, "Author liked own puzzle");
            return Err(PuzzleError::OwnPuzzle.into());
        }
        if puzzle.liked {
            return Err(PuzzleError::AlreadyLiked.into());
        }
        let puzzle = self.puzzles.like(id, user).map_err(|err| {
            if err.is_conflict() {
                Error::Puzzle(PuzzleError::AlreadyLiked)
            } else {
                Error::Repository(err)
            }
        })?;
        info!(num_likes = puzzle.num_likes, "Puzzle liked");
        Ok(puzzle)
    }
}

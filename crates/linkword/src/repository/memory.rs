//! In-process repository.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, instrument, warn};

use super::{GameRepository, PuzzleRepository, RepositoryError};
use crate::game::{Game, GameNode};
use crate::ids::{ChallengeCode, GameId, PuzzleId, UserId, UserRef};
use crate::pagination::{Cursored, GameSortKey, ListParams, PuzzleSortKey, SortKey, SortOrder};
use crate::puzzle::{Puzzle, PuzzleNode};

#[derive(Debug, Default)]
struct Store {
    puzzles: HashMap<PuzzleId, Puzzle>,
    likes: HashSet<(PuzzleId, UserId)>,
    games: HashMap<GameId, Game>,
}

impl Store {
    fn liked(&self, id: PuzzleId, viewer: Option<&UserRef>) -> bool {
        viewer.is_some_and(|v| self.likes.contains(&(id, v.id.clone())))
    }

    fn puzzle(&self, id: PuzzleId, viewer: Option<&UserRef>) -> Result<Puzzle, RepositoryError> {
        let mut puzzle = self
            .puzzles
            .get(&id)
            .cloned()
            .ok_or_else(|| RepositoryError::not_found(format!("puzzle {id}")))?;
        puzzle.liked = self.liked(id, viewer);
        Ok(puzzle)
    }

    /// Marks whether `viewer` likes the game's puzzle. The snapshot is
    /// otherwise returned as stored.
    fn hydrate(&self, mut game: Game, viewer: Option<&UserRef>) -> Game {
        game.puzzle.liked = self.liked(game.puzzle.id, viewer);
        game
    }
}

/// Keeps every entity in memory behind a mutex.
///
/// Implements both repository contracts, including the conditional game
/// update. Clones share the same store.
#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
    store: Arc<Mutex<Store>>,
}

impl MemoryRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Store>, RepositoryError> {
        self.store
            .lock()
            .map_err(|_| RepositoryError::backend("memory store lock poisoned"))
    }
}

/// Applies keyset filtering, ordering and the fetch limit to `rows`.
///
/// The lookahead row past the page lies strictly beyond the page's last
/// value, so it is only present when the next cursor can reach a row.
fn page<N: Cursored, K: SortKey>(mut rows: Vec<N>, params: &ListParams<K>) -> Vec<N> {
    let Some(accessor) = N::accessor(params.key_name()) else {
        return Vec::new();
    };
    rows.retain(|row| match (&params.after, accessor(row)) {
        (None, _) => true,
        (Some(boundary), Some(value)) => params.sort_order.is_after(&value, boundary),
        (Some(_), None) => false,
    });
    rows.sort_by(|a, b| {
        let ordering = accessor(a).cmp(&accessor(b));
        match params.sort_order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
    let rest = rows.split_off(params.limit.min(rows.len()));
    let boundary = rows.last().and_then(accessor);
    let lookahead = rest.into_iter().find(|row| match (&boundary, accessor(row)) {
        (Some(boundary), Some(value)) => params.sort_order.is_after(&value, boundary),
        _ => false,
    });
    rows.extend(lookahead);
    rows
}

impl GameRepository for MemoryRepository {
    #[instrument(skip(self, game), fields(game_id = %game.id))]
    fn create(&self, game: Game) -> Result<Game, RepositoryError> {
        let mut store = self.lock()?;
        if store.games.contains_key(&game.id)
            || store
                .games
                .values()
                .any(|g| g.challenge_code == game.challenge_code)
        {
            warn!("Duplicate game id or challenge code");
            return Err(RepositoryError::conflict(format!("game {} exists", game.id)));
        }
        store.games.insert(game.id, game.clone());
        info!("Game stored");
        let viewer = game.user.clone();
        Ok(store.hydrate(game, viewer.as_ref()))
    }

    #[instrument(skip(self, viewer))]
    fn get(&self, id: GameId, viewer: Option<&UserRef>) -> Result<Game, RepositoryError> {
        let store = self.lock()?;
        let game = store
            .games
            .get(&id)
            .cloned()
            .ok_or_else(|| RepositoryError::not_found(format!("game {id}")))?;
        debug!("Game found");
        Ok(store.hydrate(game, viewer))
    }

    #[instrument(skip(self, code, viewer), fields(code = %code))]
    fn get_with_challenge_code(
        &self,
        code: &ChallengeCode,
        viewer: Option<&UserRef>,
    ) -> Result<Game, RepositoryError> {
        let store = self.lock()?;
        let game = store
            .games
            .values()
            .find(|g| &g.challenge_code == code)
            .cloned()
            .ok_or_else(|| RepositoryError::not_found(format!("challenge {code}")))?;
        Ok(store.hydrate(game, viewer))
    }

    #[instrument(skip(self, params, for_user, viewer), fields(for_user = %for_user))]
    fn get_played(
        &self,
        params: &ListParams<GameSortKey>,
        for_user: &UserId,
        viewer: Option<&UserRef>,
    ) -> Result<Vec<GameNode>, RepositoryError> {
        let store = self.lock()?;
        let rows = store
            .games
            .values()
            .filter(|g| g.is_complete() && g.user.as_ref().is_some_and(|u| &u.id == for_user))
            .map(Game::node)
            .collect();
        debug!(viewer = ?viewer.map(|v| v.id.as_str()), "Played games listed");
        Ok(page(rows, params))
    }

    #[instrument(skip(self, game), fields(game_id = %game.id))]
    fn update(&self, game: Game) -> Result<Game, RepositoryError> {
        let mut store = self.lock()?;
        let stored = store
            .games
            .get(&game.id)
            .ok_or_else(|| RepositoryError::not_found(format!("game {}", game.id)))?;
        let raced = if game.is_complete() {
            stored.is_complete()
        } else {
            stored.is_guessed()
        };
        if raced {
            warn!("Conditional update lost");
            return Err(RepositoryError::conflict(format!(
                "game {} changed concurrently",
                game.id
            )));
        }
        store.games.insert(game.id, game.clone());
        info!("Game updated");
        let viewer = game.user.clone();
        Ok(store.hydrate(game, viewer.as_ref()))
    }
}

impl PuzzleRepository for MemoryRepository {
    #[instrument(skip(self, puzzle), fields(puzzle_id = %puzzle.id))]
    fn create(&self, mut puzzle: Puzzle) -> Result<Puzzle, RepositoryError> {
        let mut store = self.lock()?;
        if store.puzzles.contains_key(&puzzle.id) {
            return Err(RepositoryError::conflict(format!("puzzle {} exists", puzzle.id)));
        }
        puzzle.num_likes = 0;
        puzzle.liked = false;
        store.puzzles.insert(puzzle.id, puzzle.clone());
        info!("Puzzle stored");
        Ok(puzzle)
    }

    #[instrument(skip(self, viewer))]
    fn get(&self, id: PuzzleId, viewer: Option<&UserRef>) -> Result<Puzzle, RepositoryError> {
        self.lock()?.puzzle(id, viewer)
    }

    #[instrument(skip(self, puzzle), fields(puzzle_id = %puzzle.id))]
    fn update(&self, puzzle: Puzzle) -> Result<Puzzle, RepositoryError> {
        let mut store = self.lock()?;
        let stored = store
            .puzzles
            .get_mut(&puzzle.id)
            .ok_or_else(|| RepositoryError::not_found(format!("puzzle {}", puzzle.id)))?;
        stored.title = puzzle.title;
        stored.description = puzzle.description;
        stored.difficulty = puzzle.difficulty;
        stored.max_attempts = puzzle.max_attempts;
        stored.time_allowed = puzzle.time_allowed;
        stored.groups = puzzle.groups;
        stored.updated_at = puzzle.updated_at;
        info!("Puzzle updated");
        store.puzzle(puzzle.id, puzzle.user.as_ref())
    }

    #[instrument(skip(self, params, viewer))]
    fn list(
        &self,
        params: &ListParams<PuzzleSortKey>,
        viewer: Option<&UserRef>,
    ) -> Result<Vec<PuzzleNode>, RepositoryError> {
        let store = self.lock()?;
        let rows = store.puzzles.values().map(Puzzle::node).collect();
        let rows = page(rows, params);
        debug!(rows = rows.len(), viewer = ?viewer.map(|v| v.id.as_str()), "Puzzles listed");
        Ok(rows)
    }

    #[instrument(skip(self, user), fields(user = %user.id))]
    fn like(&self, id: PuzzleId, user: &UserRef) -> Result<Puzzle, RepositoryError> {
        let mut store = self.lock()?;
        if !store.puzzles.contains_key(&id) {
            return Err(RepositoryError::not_found(format!("puzzle {id}")));
        }
        if !store.likes.insert((id, user.id.clone())) {
            return Err(RepositoryError::conflict(format!("puzzle {id} already liked")));
        }
        if let Some(puzzle) = store.puzzles.get_mut(&id) {
            puzzle.num_likes += 1;
        }
        info!("Like recorded");
        store.puzzle(id, Some(user))
    }

    #[instrument(skip(self))]
    fn is_played(&self, id: PuzzleId) -> Result<bool, RepositoryError> {
        Ok(self.lock()?.games.values().any(|g| g.puzzle.id == id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::PageRequest;
    use crate::test_support::{player, sample_game, sample_puzzle};
    use chrono::Duration;

    fn complete(mut game: Game, offset_s: i64) -> Game {
        let at = game.created_at + Duration::seconds(offset_s);
        game.started_at = Some(at);
        game.guessed_at = Some(at);
        game.completed_at = Some(at);
        game
    }

    #[test]
    fn test_conditional_update_detects_race() {
        let repo = MemoryRepository::new();
        let game = GameRepository::create(&repo, sample_game()).unwrap();

        let mut guessed = game.clone();
        guessed.started_at = Some(game.created_at);
        guessed.guessed_at = Some(game.created_at);
        GameRepository::update(&repo, guessed.clone()).unwrap();

        let err = GameRepository::update(&repo, guessed).unwrap_err();
        assert!(err.is_conflict());
    }

    #[test]
    fn test_get_unknown_game_is_not_found() {
        let repo = MemoryRepository::new();
        let err = GameRepository::get(&repo, GameId::generate(), None).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_liked_is_viewer_relative() {
        let repo = MemoryRepository::new();
        let puzzle = PuzzleRepository::create(&repo, sample_puzzle()).unwrap();
        let fan = UserRef::new("fan", "Fan");

        let liked = repo.like(puzzle.id, &fan).unwrap();
        assert!(liked.liked);
        assert_eq!(liked.num_likes, 1);

        let seen_by_other = PuzzleRepository::get(&repo, puzzle.id, Some(&player())).unwrap();
        assert!(!seen_by_other.liked);
        assert_eq!(seen_by_other.num_likes, 1);

        assert!(repo.like(puzzle.id, &fan).unwrap_err().is_conflict());
    }

    #[test]
    fn test_played_lists_completed_games_only() {
        let repo = MemoryRepository::new();
        let puzzle = sample_puzzle();
        for offset in 1..=3 {
            let game = complete(Game::new(puzzle.clone(), Some(player())), offset);
            GameRepository::create(&repo, game).unwrap();
        }
        GameRepository::create(&repo, Game::new(puzzle, Some(player()))).unwrap();

        let params =
            ListParams::<GameSortKey>::parse(&PageRequest::new("completedAt", SortOrder::Desc, 2))
                .unwrap();
        let rows = repo.get_played(&params, &player().id, None).unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows.windows(2).all(|w| w[0].completed_at >= w[1].completed_at));
    }

    #[test]
    fn test_tied_likes_do_not_advertise_empty_page() {
        let repo = MemoryRepository::new();
        for _ in 0..3 {
            PuzzleRepository::create(&repo, sample_puzzle()).unwrap();
        }
        let request = PageRequest::new("numLikes", SortOrder::Desc, 1);
        let params = ListParams::<PuzzleSortKey>::parse(&request).unwrap();
        assert_eq!(repo.list(&params, None).unwrap().len(), 1);

        let liked = PuzzleRepository::create(&repo, sample_puzzle()).unwrap();
        repo.like(liked.id, &player()).unwrap();
        let rows = repo.list(&params, None).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, liked.id);
    }

    #[test]
    fn test_is_played_after_game_created() {
        let repo = MemoryRepository::new();
        let puzzle = PuzzleRepository::create(&repo, sample_puzzle()).unwrap();
        assert!(!repo.is_played(puzzle.id).unwrap());
        GameRepository::create(&repo, Game::new(puzzle.clone(), None)).unwrap();
        assert!(repo.is_played(puzzle.id).unwrap());
    }
}

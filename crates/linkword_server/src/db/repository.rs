//! SQLite implementation of the game and puzzle repositories.

use chrono::{NaiveDateTime, Utc};
use diesel::dsl::exists;
use diesel::prelude::*;
use linkword::{
    ChallengeCode, Game, GameId, GameNode, GameRepository, GameSortKey, ListParams, Puzzle,
    PuzzleId, PuzzleNode, PuzzleRepository, PuzzleSortKey, RepositoryError, RepositoryErrorKind,
    SortOrder, SortValue, UserId, UserRef,
};
use tracing::{debug, info, instrument, warn};

use crate::db::models::{GameChanges, GameRow, NewLike, PuzzleChanges, PuzzleRow};
use crate::db::{DbError, schema};

/// Milliseconds SQLite waits on a locked database before giving up.
const BUSY_TIMEOUT_MS: u32 = 5_000;

/// Database repository for puzzles, likes and games.
///
/// Opens a connection per call, so one value can be shared across
/// blocking worker threads.
#[derive(Debug, Clone)]
pub struct SqliteRepository {
    db_path: String,
}

impl SqliteRepository {
    /// Creates a repository for the database at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the path is empty.
    #[instrument(skip(db_path), fields(db_path = %db_path))]
    pub fn new(db_path: String) -> Result<Self, DbError> {
        if db_path.trim().is_empty() {
            return Err(DbError::new("Database path is empty"));
        }
        info!(path = %db_path, "Creating SqliteRepository");
        Ok(Self { db_path })
    }

    /// Path of the backing database.
    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    /// Establishes a database connection.
    #[instrument(skip(self))]
    fn connection(&self) -> Result<SqliteConnection, DbError> {
        debug!(path = %self.db_path, "Establishing connection");
        let mut conn = SqliteConnection::establish(&self.db_path).map_err(|e| {
            DbError::new(format!("Failed to connect to '{}': {}", self.db_path, e))
        })?;
        diesel::sql_query(format!("PRAGMA busy_timeout = {}", BUSY_TIMEOUT_MS))
            .execute(&mut conn)?;
        Ok(conn)
    }
}

fn viewer_liked(
    conn: &mut SqliteConnection,
    puzzle_id: &str,
    viewer: Option<&UserRef>,
) -> Result<bool, DbError> {
    let Some(viewer) = viewer else {
        return Ok(false);
    };
    let found = diesel::select(exists(
        schema::puzzle_likes::table
            .filter(schema::puzzle_likes::puzzle_id.eq(puzzle_id))
            .filter(schema::puzzle_likes::user_id.eq(viewer.id.as_str())),
    ))
    .get_result(conn)?;
    Ok(found)
}

fn load_puzzle(
    conn: &mut SqliteConnection,
    id: &str,
    viewer: Option<&UserRef>,
) -> Result<Puzzle, DbError> {
    let row = schema::puzzles::table
        .find(id)
        .select(PuzzleRow::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| DbError::not_found(format!("puzzle {}", id)))?;
    let liked = viewer_liked(conn, id, viewer)?;
    row.into_puzzle(liked)
}

fn hydrate(
    conn: &mut SqliteConnection,
    row: GameRow,
    viewer: Option<&UserRef>,
) -> Result<Game, DbError> {
    let liked = viewer_liked(conn, row.puzzle_id(), viewer)?;
    row.into_game(liked)
}

fn load_game(
    conn: &mut SqliteConnection,
    id: &str,
    viewer: Option<&UserRef>,
) -> Result<Game, DbError> {
    let row = schema::games::table
        .find(id)
        .select(GameRow::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| DbError::not_found(format!("game {}", id)))?;
    hydrate(conn, row, viewer)
}

#[track_caller]
fn time_boundary(value: &SortValue) -> Result<NaiveDateTime, DbError> {
    match value {
        SortValue::Time(time) => Ok(time.naive_utc()),
        other => Err(DbError::new(format!("Expected a time boundary, got {:?}", other))),
    }
}

#[track_caller]
fn count_boundary(value: &SortValue) -> Result<i64, DbError> {
    match value {
        SortValue::Unsigned(n) => {
            i64::try_from(*n).map_err(|_| DbError::new(format!("Boundary out of range: {}", n)))
        }
        other => Err(DbError::new(format!("Expected a count boundary, got {:?}", other))),
    }
}

#[track_caller]
fn fetch_limit<K>(params: &ListParams<K>) -> Result<i64, DbError> {
    i64::try_from(params.limit + 1).map_err(|_| DbError::new("Fetch limit out of range"))
}

impl GameRepository for SqliteRepository {
    #[instrument(skip(self, game), fields(game_id = %game.id, puzzle_id = %game.puzzle.id))]
    fn create(&self, game: Game) -> Result<Game, RepositoryError> {
        debug!("Inserting game");
        let mut conn = self.connection()?;
        let row = GameRow::from_game(&game)?;

        let stored = diesel::insert_into(schema::games::table)
            .values(&row)
            .returning(GameRow::as_returning())
            .get_result(&mut conn)
            .map_err(DbError::from)?;

        info!(challenge_code = %stored.challenge_code(), "Game stored");
        Ok(hydrate(&mut conn, stored, game.user.as_ref())?)
    }

    #[instrument(skip(self, viewer))]
    fn get(&self, id: GameId, viewer: Option<&UserRef>) -> Result<Game, RepositoryError> {
        debug!("Loading game");
        let mut conn = self.connection()?;
        Ok(load_game(&mut conn, &id.to_string(), viewer)?)
    }

    #[instrument(skip(self, code, viewer), fields(code = %code))]
    fn get_with_challenge_code(
        &self,
        code: &ChallengeCode,
        viewer: Option<&UserRef>,
    ) -> Result<Game, RepositoryError> {
        debug!("Loading game by challenge code");
        let mut conn = self.connection()?;
        let row = schema::games::table
            .filter(schema::games::challenge_code.eq(code.as_str()))
            .select(GameRow::as_select())
            .first(&mut conn)
            .optional()
            .map_err(DbError::from)?
            .ok_or_else(|| DbError::not_found(format!("challenge {}", code)))?;
        Ok(hydrate(&mut conn, row, viewer)?)
    }

    #[instrument(
        skip(self, params, for_user, viewer),
        fields(for_user = %for_user, sort_key = %params.sort_key)
    )]
    fn get_played(
        &self,
        params: &ListParams<GameSortKey>,
        for_user: &UserId,
        viewer: Option<&UserRef>,
    ) -> Result<Vec<GameNode>, RepositoryError> {
        let mut conn = self.connection()?;
        let mut query = schema::games::table
            .filter(schema::games::user_id.eq(for_user.as_str()))
            .filter(schema::games::completed_at.is_not_null())
            .select(GameRow::as_select())
            .into_boxed();

        match params.sort_key {
            GameSortKey::CreatedAt => {
                let column = schema::games::created_at;
                if let Some(after) = &params.after {
                    let boundary = time_boundary(after)?;
                    query = match params.sort_order {
                        SortOrder::Asc => query.filter(column.gt(boundary)),
                        SortOrder::Desc => query.filter(column.lt(boundary)),
                    };
                }
                query = match params.sort_order {
                    SortOrder::Asc => query.order(column.asc()),
                    SortOrder::Desc => query.order(column.desc()),
                };
            }
            GameSortKey::CompletedAt => {
                let column = schema::games::completed_at;
                if let Some(after) = &params.after {
                    let boundary = time_boundary(after)?;
                    query = match params.sort_order {
                        SortOrder::Asc => query.filter(column.gt(boundary)),
                        SortOrder::Desc => query.filter(column.lt(boundary)),
                    };
                }
                query = match params.sort_order {
                    SortOrder::Asc => query.order(column.asc()),
                    SortOrder::Desc => query.order(column.desc()),
                };
            }
        }

        let rows: Vec<GameRow> = query
            .then_order_by(schema::games::id.asc())
            .limit(fetch_limit(params)?)
            .load(&mut conn)
            .map_err(DbError::from)?;

        let nodes = rows
            .iter()
            .map(GameRow::node)
            .collect::<Result<Vec<_>, DbError>>()?;
        debug!(rows = nodes.len(), viewer = ?viewer.map(|v| v.id.as_str()), "Played games listed");
        Ok(nodes)
    }

    #[instrument(skip(self, game), fields(game_id = %game.id, complete = game.is_complete()))]
    fn update(&self, game: Game) -> Result<Game, RepositoryError> {
        let mut conn = self.connection()?;
        let id = game.id.to_string();
        let changes = GameChanges::from_game(&game)?;
        let target = schema::games::table.filter(schema::games::id.eq(&id));

        // Completing requires an incomplete row; guessing requires an unguessed one.
        let written = if game.is_complete() {
            diesel::update(target.filter(schema::games::completed_at.is_null()))
                .set(&changes)
                .execute(&mut conn)
        } else {
            diesel::update(target.filter(schema::games::guessed_at.is_null()))
                .set(&changes)
                .execute(&mut conn)
        };
        let affected = written.map_err(DbError::from)?;

        if affected == 0 {
            let present: bool = diesel::select(exists(
                schema::games::table.filter(schema::games::id.eq(&id)),
            ))
            .get_result(&mut conn)
            .map_err(DbError::from)?;
            if !present {
                return Err(DbError::not_found(format!("game {}", id)).into());
            }
            warn!("Conditional update lost");
            return Err(DbError::conflict(format!("game {} changed concurrently", id)).into());
        }

        info!("Game updated");
        Ok(load_game(&mut conn, &id, game.user.as_ref())?)
    }
}

impl PuzzleRepository for SqliteRepository {
    #[instrument(skip(self, puzzle), fields(puzzle_id = %puzzle.id))]
    fn create(&self, mut puzzle: Puzzle) -> Result<Puzzle, RepositoryError> {
        debug!("Inserting puzzle");
        let mut conn = self.connection()?;
        puzzle.num_likes = 0;
        let row = PuzzleRow::from_puzzle(&puzzle)?;

        let stored = diesel::insert_into(schema::puzzles::table)
            .values(&row)
            .returning(PuzzleRow::as_returning())
            .get_result(&mut conn)
            .map_err(DbError::from)?;

        info!(title = %stored.title(), "Puzzle stored");
        Ok(stored.into_puzzle(false)?)
    }

    #[instrument(skip(self, viewer))]
    fn get(&self, id: PuzzleId, viewer: Option<&UserRef>) -> Result<Puzzle, RepositoryError> {
        debug!("Loading puzzle");
        let mut conn = self.connection()?;
        Ok(load_puzzle(&mut conn, &id.to_string(), viewer)?)
    }

    #[instrument(skip(self, puzzle), fields(puzzle_id = %puzzle.id))]
    fn update(&self, puzzle: Puzzle) -> Result<Puzzle, RepositoryError> {
        let mut conn = self.connection()?;
        let id = puzzle.id.to_string();
        let changes = PuzzleChanges::from_puzzle(&puzzle)?;

        let affected = diesel::update(schema::puzzles::table.find(&id))
            .set(&changes)
            .execute(&mut conn)
            .map_err(DbError::from)?;
        if affected == 0 {
            return Err(DbError::not_found(format!("puzzle {}", id)).into());
        }

        info!("Puzzle updated");
        Ok(load_puzzle(&mut conn, &id, puzzle.user.as_ref())?)
    }

    #[instrument(skip(self, params, viewer), fields(sort_key = %params.sort_key))]
    fn list(
        &self,
        params: &ListParams<PuzzleSortKey>,
        viewer: Option<&UserRef>,
    ) -> Result<Vec<PuzzleNode>, RepositoryError> {
        let mut conn = self.connection()?;
        let mut query = schema::puzzles::table
            .select(PuzzleRow::as_select())
            .into_boxed();

        match params.sort_key {
            PuzzleSortKey::CreatedAt => {
                let column = schema::puzzles::created_at;
                if let Some(after) = &params.after {
                    let boundary = time_boundary(after)?;
                    query = match params.sort_order {
                        SortOrder::Asc => query.filter(column.gt(boundary)),
                        SortOrder::Desc => query.filter(column.lt(boundary)),
                    };
                }
                query = match params.sort_order {
                    SortOrder::Asc => query.order(column.asc()),
                    SortOrder::Desc => query.order(column.desc()),
                };
            }
            PuzzleSortKey::NumLikes => {
                let column = schema::puzzles::num_likes;
                if let Some(after) = &params.after {
                    let boundary = count_boundary(after)?;
                    query = match params.sort_order {
                        SortOrder::Asc => query.filter(column.gt(boundary)),
                        SortOrder::Desc => query.filter(column.lt(boundary)),
                    };
                }
                query = match params.sort_order {
                    SortOrder::Asc => query.order(column.asc()),
                    SortOrder::Desc => query.order(column.desc()),
                };
            }
        }

        let mut rows: Vec<PuzzleRow> = query
            .then_order_by(schema::puzzles::created_at.desc())
            .limit(fetch_limit(params)?)
            .load(&mut conn)
            .map_err(DbError::from)?;

        // Likes tie; the lookahead row must clear the page's last count.
        if params.sort_key == PuzzleSortKey::NumLikes && rows.len() > params.limit {
            rows.truncate(params.limit);
            if let Some(last) = rows.last().map(|row| *row.num_likes()) {
                let column = schema::puzzles::num_likes;
                let beyond = schema::puzzles::table
                    .select(PuzzleRow::as_select())
                    .into_boxed();
                let beyond = match params.sort_order {
                    SortOrder::Asc => beyond.filter(column.gt(last)).order(column.asc()),
                    SortOrder::Desc => beyond.filter(column.lt(last)).order(column.desc()),
                };
                let next: Option<PuzzleRow> =
                    beyond.first(&mut conn).optional().map_err(DbError::from)?;
                rows.extend(next);
            }
        }

        let nodes = rows
            .iter()
            .map(PuzzleRow::node)
            .collect::<Result<Vec<_>, DbError>>()?;
        debug!(rows = nodes.len(), viewer = ?viewer.map(|v| v.id.as_str()), "Puzzles listed");
        Ok(nodes)
    }

    #[instrument(skip(self, user), fields(user = %user.id))]
    fn like(&self, id: PuzzleId, user: &UserRef) -> Result<Puzzle, RepositoryError> {
        let mut conn = self.connection()?;
        let id = id.to_string();

        conn.transaction::<_, DbError, _>(|conn| {
            let known: bool =
                diesel::select(exists(schema::puzzles::table.find(&id))).get_result(conn)?;
            if !known {
                return Err(DbError::not_found(format!("puzzle {}", id)));
            }

            diesel::insert_into(schema::puzzle_likes::table)
                .values(&NewLike::new(
                    id.clone(),
                    user.id.as_str().to_string(),
                    Utc::now().naive_utc(),
                ))
                .execute(conn)
                .map_err(|e| match DbError::from(e) {
                    err if err.kind == RepositoryErrorKind::Conflict => {
                        DbError::conflict(format!("puzzle {} already liked", id))
                    }
                    err => err,
                })?;

            diesel::update(schema::puzzles::table.find(&id))
                .set(schema::puzzles::num_likes.eq(schema::puzzles::num_likes + 1))
                .execute(conn)?;
            Ok(())
        })?;

        info!("Like recorded");
        Ok(load_puzzle(&mut conn, &id, Some(user))?)
    }

    #[instrument(skip(self))]
    fn is_played(&self, id: PuzzleId) -> Result<bool, RepositoryError> {
        let mut conn = self.connection()?;
        let played = diesel::select(exists(
            schema::games::table.filter(schema::games::puzzle_id.eq(id.to_string())),
        ))
        .get_result(&mut conn)
        .map_err(DbError::from)?;
        Ok(played)
    }
}

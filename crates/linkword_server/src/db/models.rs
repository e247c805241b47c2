//! Diesel models for puzzles, games and likes.
//!
//! Nested structures (groups, attempts, results, challenge links and each
//! game's puzzle snapshot) live in JSON text columns; everything the queries
//! filter or sort on is a plain column.

use chrono::{DateTime, NaiveDateTime, Utc};
use derive_getters::Getters;
use derive_new::new;
use diesel::prelude::*;
use linkword::{
    ChallengeCode, Config, Difficulty, Game, GameNode, Puzzle, PuzzleNode, UserRef,
};

use super::error::DbError;
use super::schema::{games, puzzle_likes, puzzles};

fn naive(time: DateTime<Utc>) -> NaiveDateTime {
    time.naive_utc()
}

fn utc(time: NaiveDateTime) -> DateTime<Utc> {
    time.and_utc()
}

fn user_columns(user: Option<&UserRef>) -> (Option<String>, Option<String>) {
    match user {
        Some(user) => (Some(user.id.as_str().to_string()), Some(user.name.clone())),
        None => (None, None),
    }
}

fn user_ref(id: Option<&String>, name: Option<&String>) -> Option<UserRef> {
    id.map(|id| UserRef::new(id.clone(), name.cloned().unwrap_or_default()))
}

#[track_caller]
fn parse_id<T: std::str::FromStr>(raw: &str, what: &str) -> Result<T, DbError> {
    raw.parse()
        .map_err(|_| DbError::new(format!("Malformed {} id: {}", what, raw)))
}

#[track_caller]
fn narrow<T: TryFrom<i64>>(value: i64, column: &str) -> Result<T, DbError> {
    T::try_from(value).map_err(|_| DbError::new(format!("{} out of range: {}", column, value)))
}

/// A row of the `puzzles` table.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, Getters)]
#[diesel(table_name = puzzles)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PuzzleRow {
    id: String,
    title: String,
    description: Option<String>,
    difficulty: String,
    max_attempts: i32,
    time_allowed: i64,
    groups_json: String,
    num_likes: i64,
    user_id: Option<String>,
    user_name: Option<String>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl PuzzleRow {
    /// Flattens a puzzle into a row.
    pub fn from_puzzle(puzzle: &Puzzle) -> Result<Self, DbError> {
        let (user_id, user_name) = user_columns(puzzle.user.as_ref());
        Ok(Self {
            id: puzzle.id.to_string(),
            title: puzzle.title.clone(),
            description: puzzle.description.clone(),
            difficulty: puzzle.difficulty.as_ref().to_string(),
            max_attempts: i32::from(puzzle.max_attempts),
            time_allowed: i64::from(puzzle.time_allowed),
            groups_json: serde_json::to_string(&puzzle.groups)?,
            num_likes: i64::try_from(puzzle.num_likes)
                .map_err(|_| DbError::new("num_likes out of range"))?,
            user_id,
            user_name,
            created_at: naive(puzzle.created_at),
            updated_at: naive(puzzle.updated_at),
        })
    }

    fn difficulty_value(&self) -> Result<Difficulty, DbError> {
        self.difficulty
            .parse()
            .map_err(|_| DbError::new(format!("Unknown difficulty: {}", self.difficulty)))
    }

    /// Rebuilds the puzzle; `liked` is relative to whoever is reading.
    pub fn into_puzzle(self, liked: bool) -> Result<Puzzle, DbError> {
        Ok(Puzzle {
            id: parse_id(&self.id, "puzzle")?,
            difficulty: self.difficulty_value()?,
            max_attempts: narrow(i64::from(self.max_attempts), "max_attempts")?,
            time_allowed: narrow(self.time_allowed, "time_allowed")?,
            groups: serde_json::from_str(&self.groups_json)?,
            num_likes: narrow(self.num_likes, "num_likes")?,
            liked,
            created_at: utc(self.created_at),
            updated_at: utc(self.updated_at),
            user: user_ref(self.user_id.as_ref(), self.user_name.as_ref()),
            title: self.title,
            description: self.description,
        })
    }

    /// Listing projection, built without decoding the groups.
    pub fn node(&self) -> Result<PuzzleNode, DbError> {
        Ok(PuzzleNode {
            id: parse_id(&self.id, "puzzle")?,
            title: self.title.clone(),
            difficulty: self.difficulty_value()?,
            num_likes: narrow(self.num_likes, "num_likes")?,
            created_at: utc(self.created_at),
            user: user_ref(self.user_id.as_ref(), self.user_name.as_ref()),
        })
    }
}

/// Columns an author may change on an existing puzzle.
#[derive(Debug, Clone, AsChangeset, new)]
#[diesel(table_name = puzzles)]
#[diesel(treat_none_as_null = true)]
pub struct PuzzleChanges {
    title: String,
    description: Option<String>,
    difficulty: String,
    max_attempts: i32,
    time_allowed: i64,
    groups_json: String,
    updated_at: NaiveDateTime,
}

impl PuzzleChanges {
    /// Extracts the editable columns of `puzzle`.
    pub fn from_puzzle(puzzle: &Puzzle) -> Result<Self, DbError> {
        Ok(Self::new(
            puzzle.title.clone(),
            puzzle.description.clone(),
            puzzle.difficulty.as_ref().to_string(),
            i32::from(puzzle.max_attempts),
            i64::from(puzzle.time_allowed),
            serde_json::to_string(&puzzle.groups)?,
            naive(puzzle.updated_at),
        ))
    }
}

/// A row of the `puzzle_likes` table.
#[derive(Debug, Clone, Insertable, new)]
#[diesel(table_name = puzzle_likes)]
pub struct NewLike {
    puzzle_id: String,
    user_id: String,
    created_at: NaiveDateTime,
}

/// A row of the `games` table.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, Getters)]
#[diesel(table_name = games)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct GameRow {
    id: String,
    puzzle_id: String,
    puzzle_json: String,
    score: i32,
    attempts_json: String,
    correct_json: String,
    max_attempts: i32,
    time_allowed: i64,
    results_json: String,
    challenge_code: String,
    created_at: NaiveDateTime,
    started_at: Option<NaiveDateTime>,
    guessed_at: Option<NaiveDateTime>,
    completed_at: Option<NaiveDateTime>,
    challenged_by_json: Option<String>,
    user_id: Option<String>,
    user_name: Option<String>,
}

impl GameRow {
    /// Flattens a game into a row, puzzle snapshot included.
    pub fn from_game(game: &Game) -> Result<Self, DbError> {
        let (user_id, user_name) = user_columns(game.user.as_ref());
        Ok(Self {
            id: game.id.to_string(),
            puzzle_id: game.puzzle.id.to_string(),
            puzzle_json: serde_json::to_string(&game.puzzle)?,
            score: i32::from(game.score),
            attempts_json: serde_json::to_string(&game.attempts)?,
            correct_json: serde_json::to_string(&game.correct)?,
            max_attempts: i32::from(game.config.max_attempts),
            time_allowed: i64::from(game.config.time_allowed),
            results_json: serde_json::to_string(&game.results)?,
            challenge_code: game.challenge_code.as_str().to_string(),
            created_at: naive(game.created_at),
            started_at: game.started_at.map(naive),
            guessed_at: game.guessed_at.map(naive),
            completed_at: game.completed_at.map(naive),
            challenged_by_json: game
                .challenged_by
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?,
            user_id,
            user_name,
        })
    }

    fn snapshot(&self) -> Result<Puzzle, DbError> {
        Ok(serde_json::from_str(&self.puzzle_json)?)
    }

    /// Rebuilds the game. `liked` is relative to whoever reads it.
    pub fn into_game(self, liked: bool) -> Result<Game, DbError> {
        let mut puzzle = self.snapshot()?;
        puzzle.liked = liked;
        Ok(Game {
            id: parse_id(&self.id, "game")?,
            score: narrow(i64::from(self.score), "score")?,
            attempts: serde_json::from_str(&self.attempts_json)?,
            correct: serde_json::from_str(&self.correct_json)?,
            config: Config::new(
                narrow(i64::from(self.max_attempts), "max_attempts")?,
                narrow(self.time_allowed, "time_allowed")?,
            ),
            results: serde_json::from_str(&self.results_json)?,
            challenge_code: ChallengeCode::new(self.challenge_code),
            created_at: utc(self.created_at),
            started_at: self.started_at.map(utc),
            guessed_at: self.guessed_at.map(utc),
            completed_at: self.completed_at.map(utc),
            challenged_by: self
                .challenged_by_json
                .as_deref()
                .map(serde_json::from_str)
                .transpose()?,
            puzzle,
            user: user_ref(self.user_id.as_ref(), self.user_name.as_ref()),
        })
    }

    /// History projection, titled from the snapshot the game was played on.
    pub fn node(&self) -> Result<GameNode, DbError> {
        let puzzle = self.snapshot()?;
        Ok(GameNode {
            id: parse_id(&self.id, "game")?,
            score: narrow(i64::from(self.score), "score")?,
            challenge_code: ChallengeCode::new(self.challenge_code.clone()),
            created_at: utc(self.created_at),
            completed_at: self.completed_at.map(utc),
            puzzle_id: parse_id(&self.puzzle_id, "puzzle")?,
            puzzle_title: puzzle.title,
            difficulty: puzzle.difficulty,
            user: user_ref(self.user_id.as_ref(), self.user_name.as_ref()),
        })
    }
}

/// Columns the guess and complete transitions may change.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = games)]
#[diesel(treat_none_as_null = true)]
pub struct GameChanges {
    score: i32,
    attempts_json: String,
    correct_json: String,
    max_attempts: i32,
    time_allowed: i64,
    results_json: String,
    started_at: Option<NaiveDateTime>,
    guessed_at: Option<NaiveDateTime>,
    completed_at: Option<NaiveDateTime>,
}

impl GameChanges {
    /// Extracts the mutable columns of `game`.
    pub fn from_game(game: &Game) -> Result<Self, DbError> {
        Ok(Self {
            score: i32::from(game.score),
            attempts_json: serde_json::to_string(&game.attempts)?,
            correct_json: serde_json::to_string(&game.correct)?,
            max_attempts: i32::from(game.config.max_attempts),
            time_allowed: i64::from(game.config.time_allowed),
            results_json: serde_json::to_string(&game.results)?,
            started_at: game.started_at.map(naive),
            guessed_at: game.guessed_at.map(naive),
            completed_at: game.completed_at.map(naive),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linkword::{Block, BlockId, Group, GroupId, PuzzleId};

    fn puzzle() -> Puzzle {
        let now = Utc::now();
        Puzzle {
            id: PuzzleId::generate(),
            title: "Rows".to_string(),
            description: Some("stored".to_string()),
            difficulty: Difficulty::Medium,
            max_attempts: 7,
            time_allowed: 0,
            groups: (0..4)
                .map(|g| {
                    Group::new(
                        GroupId::generate(),
                        vec![format!("answer {g}")],
                        (0..4)
                            .map(|b| Block::new(BlockId::generate(), format!("{g}{b}")))
                            .collect(),
                    )
                })
                .collect(),
            num_likes: 3,
            liked: true,
            created_at: now,
            updated_at: now,
            user: Some(UserRef::new("u1", "Ada")),
        }
    }

    #[test]
    fn test_puzzle_row_keeps_columns() {
        let original = puzzle();
        let row = PuzzleRow::from_puzzle(&original).unwrap();
        assert_eq!(row.difficulty(), "medium");
        assert_eq!(*row.max_attempts(), 7);

        let restored = row.into_puzzle(true).unwrap();
        assert_eq!(restored, original);
    }

    #[test]
    fn test_liked_comes_from_reader() {
        let row = PuzzleRow::from_puzzle(&puzzle()).unwrap();
        assert!(!row.into_puzzle(false).unwrap().liked);
    }

    #[test]
    fn test_anonymous_user_has_no_columns() {
        assert_eq!(user_columns(None), (None, None));
        assert_eq!(user_ref(None, Some(&"ghost".to_string())), None);
    }

    #[test]
    fn test_game_row_keeps_puzzle_snapshot() {
        let original = Game::new(puzzle(), Some(UserRef::new("u2", "Grace")));
        let row = GameRow::from_game(&original).unwrap();
        assert_eq!(row.node().unwrap().puzzle_title, "Rows");

        let restored = row.into_game(true).unwrap();
        assert_eq!(restored, original);
        assert_eq!(restored.puzzle.num_likes, 3);
    }

    #[test]
    fn test_bad_difficulty_rejected() {
        let mut row = PuzzleRow::from_puzzle(&puzzle()).unwrap();
        row.difficulty = "brutal".to_string();
        assert!(row.node().is_err());
    }
}

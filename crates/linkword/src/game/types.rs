//! Game domain types.

use chrono::{DateTime, Utc};
use derive_new::new;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::ids::{BlockId, ChallengeCode, GameId, GroupId, PuzzleId, UserRef};
use crate::pagination::{Accessor, Cursored, SortValue};
use crate::puzzle::{Difficulty, Puzzle};

/// Attempt and time budget of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, new)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Maximum number of attempts; 0 means unlimited.
    pub max_attempts: u16,
    /// Time budget in milliseconds; 0 means unlimited.
    pub time_allowed: u32,
}

impl Config {
    /// Budget derived from difficulty alone.
    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        match difficulty {
            Difficulty::Hard => Self::new(12, 180_000),
            Difficulty::Medium => Self::new(18, 300_000),
            Difficulty::Easy => Self::new(24, 600_000),
        }
    }

    /// Budget for a new game of `puzzle`: non-zero overrides win.
    #[instrument(skip(puzzle), fields(puzzle_id = %puzzle.id, difficulty = %puzzle.difficulty))]
    pub fn for_puzzle(puzzle: &Puzzle) -> Self {
        let mut config = Self::for_difficulty(puzzle.difficulty);
        if puzzle.locks_max_attempts() {
            config.max_attempts = puzzle.max_attempts;
        }
        if puzzle.locks_time_allowed() {
            config.time_allowed = puzzle.time_allowed;
        }
        config
    }
}

/// The player's guess at one group's connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, new)]
#[serde(rename_all = "camelCase")]
pub struct GameResult {
    /// Group the guess is about.
    pub puzzle_group_id: GroupId,
    /// The guessed connection.
    pub guess: String,
    /// Whether the guess matched one of the group's answers.
    #[serde(default)]
    pub correct: bool,
}

/// Compact projection of a game, used as a challenge-chain link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSummary {
    /// Game id.
    pub id: GameId,
    /// Final or current score.
    pub score: u8,
    /// The game's challenge code.
    pub challenge_code: ChallengeCode,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Completion time, if complete.
    pub completed_at: Option<DateTime<Utc>>,
    /// Player, if not anonymous.
    pub user: Option<UserRef>,
}

/// A play session of a puzzle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    /// Game id.
    pub id: GameId,
    /// Score, 0 to 8.
    pub score: u8,
    /// Linking attempts in order; each is four block ids.
    pub attempts: Vec<Vec<BlockId>>,
    /// Groups the player linked correctly.
    pub correct: Vec<GroupId>,
    /// Attempt and time budget.
    pub config: Config,
    /// Connection guesses, one per group, present once complete.
    pub results: Vec<GameResult>,
    /// Code other players use to challenge this game.
    pub challenge_code: ChallengeCode,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Time the player started linking.
    pub started_at: Option<DateTime<Utc>>,
    /// Time the linking phase closed.
    pub guessed_at: Option<DateTime<Utc>>,
    /// Time the game completed.
    pub completed_at: Option<DateTime<Utc>>,
    /// Root of the challenge chain this game belongs to.
    pub challenged_by: Option<GameSummary>,
    /// Snapshot of the puzzle being played.
    pub puzzle: Puzzle,
    /// Player, if not anonymous.
    pub user: Option<UserRef>,
}

impl Game {
    /// Summary projection, used as a challenge-chain link.
    pub fn summary(&self) -> GameSummary {
        GameSummary {
            id: self.id,
            score: self.score,
            challenge_code: self.challenge_code.clone(),
            created_at: self.created_at,
            completed_at: self.completed_at,
            user: self.user.clone(),
        }
    }

    /// History projection used in played-game listings.
    pub fn node(&self) -> GameNode {
        GameNode {
            id: self.id,
            score: self.score,
            challenge_code: self.challenge_code.clone(),
            created_at: self.created_at,
            completed_at: self.completed_at,
            puzzle_id: self.puzzle.id,
            puzzle_title: self.puzzle.title.clone(),
            difficulty: self.puzzle.difficulty,
            user: self.user.clone(),
        }
    }

    /// Returns true once the game is complete and can no longer change.
    pub fn is_complete(&self) -> bool {
        self.completed_at.is_some()
    }

    /// Returns true once the linking phase has closed.
    pub fn is_guessed(&self) -> bool {
        self.guessed_at.is_some()
    }
}

/// A proposed mutation of a game, as sent by a client.
///
/// Which fields are honoured depends on the transition the update is used
/// for; everything else is taken from the stored game. The budget is never
/// part of an update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameUpdate {
    /// Id of the game being changed.
    pub id: GameId,
    /// Proposed score.
    #[serde(default)]
    pub score: u8,
    /// Linking attempts, if the client reports them.
    #[serde(default)]
    pub attempts: Option<Vec<Vec<BlockId>>>,
    /// Groups linked correctly.
    #[serde(default)]
    pub correct: Vec<GroupId>,
    /// Connection guesses.
    #[serde(default)]
    pub results: Vec<GameResult>,
    /// Start of the linking phase.
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    /// End of the linking phase.
    #[serde(default)]
    pub guessed_at: Option<DateTime<Utc>>,
    /// Completion time.
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl GameUpdate {
    /// An update that proposes nothing beyond the game id.
    pub fn new(id: GameId) -> Self {
        Self {
            id,
            score: 0,
            attempts: None,
            correct: Vec::new(),
            results: Vec::new(),
            started_at: None,
            guessed_at: None,
            completed_at: None,
        }
    }
}

/// Listing projection of a played game. Carries no answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameNode {
    /// Game id.
    pub id: GameId,
    /// Score.
    pub score: u8,
    /// Challenge code.
    pub challenge_code: ChallengeCode,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Completion time.
    pub completed_at: Option<DateTime<Utc>>,
    /// Puzzle played.
    pub puzzle_id: PuzzleId,
    /// Title of the puzzle played.
    pub puzzle_title: String,
    /// Difficulty of the puzzle played.
    pub difficulty: Difficulty,
    /// Player.
    pub user: Option<UserRef>,
}

impl Cursored for GameNode {
    const SORT_KEYS: &'static [(&'static str, Accessor<Self>)] = &[
        ("createdAt", |node: &GameNode| Some(SortValue::Time(node.created_at))),
        ("completedAt", |node: &GameNode| node.completed_at.map(SortValue::Time)),
        ("score", |node: &GameNode| Some(SortValue::Unsigned(u64::from(node.score)))),
    ];
}

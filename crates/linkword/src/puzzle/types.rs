//! Puzzle domain types.

use chrono::{DateTime, Utc};
use derive_new::new;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::ids::{BlockId, GroupId, PuzzleId, UserRef};
use crate::pagination::{Accessor, Cursored, SortValue};

/// Number of groups in every puzzle.
pub const GROUP_COUNT: usize = 4;
/// Number of blocks in every group.
pub const BLOCKS_PER_GROUP: usize = 4;
/// Maximum number of accepted answers per group.
pub const MAX_ANSWERS: usize = 8;

/// Puzzle difficulty. Drives the default attempt and time budget.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase", ascii_case_insensitive)]
pub enum Difficulty {
    /// 24 attempts, ten minutes.
    #[default]
    Easy,
    /// 18 attempts, five minutes.
    Medium,
    /// 12 attempts, three minutes.
    Hard,
}

/// One of the sixteen text blocks shown on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, new)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    /// Block id.
    pub id: BlockId,
    /// Text shown on the board.
    pub value: String,
}

/// A hidden group of four blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, new)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    /// Group id.
    pub id: GroupId,
    /// Accepted names for the connection between the blocks.
    pub answers: Vec<String>,
    /// The four blocks of the group.
    pub blocks: Vec<Block>,
}

impl Group {
    /// Returns true if `guess` names this group's connection.
    pub fn accepts(&self, guess: &str) -> bool {
        let guess = guess.trim();
        !guess.is_empty()
            && self
                .answers
                .iter()
                .any(|answer| answer.trim().eq_ignore_ascii_case(guess))
    }
}

/// A published puzzle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Puzzle {
    /// Puzzle id.
    pub id: PuzzleId,
    /// Title shown in listings.
    pub title: String,
    /// Optional free-text description.
    #[serde(default)]
    pub description: Option<String>,
    /// Difficulty.
    pub difficulty: Difficulty,
    /// Attempt override; 0 means derived from difficulty.
    #[serde(default)]
    pub max_attempts: u16,
    /// Time override in milliseconds; 0 means derived from difficulty.
    #[serde(default)]
    pub time_allowed: u32,
    /// The four groups.
    pub groups: Vec<Group>,
    /// Number of likes.
    #[serde(default)]
    pub num_likes: u64,
    /// Whether the viewing user liked this puzzle.
    #[serde(default)]
    pub liked: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
    /// Author, if the puzzle was not created anonymously.
    #[serde(default)]
    pub user: Option<UserRef>,
}

impl Puzzle {
    /// Iterates over the ids of all sixteen blocks.
    pub fn block_ids(&self) -> impl Iterator<Item = BlockId> + '_ {
        self.groups
            .iter()
            .flat_map(|group| group.blocks.iter().map(|block| block.id))
    }

    /// Iterates over the group ids.
    pub fn group_ids(&self) -> impl Iterator<Item = GroupId> + '_ {
        self.groups.iter().map(|group| group.id)
    }

    /// Looks up a group by id.
    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.iter().find(|group| group.id == id)
    }

    /// Returns true if the puzzle fixes the attempt budget.
    pub fn locks_max_attempts(&self) -> bool {
        self.max_attempts != 0
    }

    /// Returns true if the puzzle fixes the time budget.
    pub fn locks_time_allowed(&self) -> bool {
        self.time_allowed != 0
    }

    /// Listing projection of the puzzle.
    pub fn node(&self) -> PuzzleNode {
        PuzzleNode {
            id: self.id,
            title: self.title.clone(),
            difficulty: self.difficulty,
            num_likes: self.num_likes,
            created_at: self.created_at,
            user: self.user.clone(),
        }
    }
}

/// A group as submitted by a puzzle author, before ids are assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, new)]
#[serde(rename_all = "camelCase")]
pub struct NewGroup {
    /// Accepted answers.
    pub answers: Vec<String>,
    /// Block texts.
    pub blocks: Vec<String>,
}

/// A puzzle as submitted by its author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, new)]
#[serde(rename_all = "camelCase")]
pub struct NewPuzzle {
    /// Title.
    pub title: String,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// Difficulty.
    #[serde(default)]
    pub difficulty: Difficulty,
    /// Attempt override, 0 for none.
    #[serde(default)]
    pub max_attempts: u16,
    /// Time override in milliseconds, 0 for none.
    #[serde(default)]
    pub time_allowed: u32,
    /// The four groups.
    pub groups: Vec<NewGroup>,
}

/// A proposed change to an existing puzzle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PuzzleUpdate {
    /// Id of the puzzle being changed.
    pub id: PuzzleId,
    /// New title.
    pub title: String,
    /// New description.
    #[serde(default)]
    pub description: Option<String>,
    /// New difficulty.
    pub difficulty: Difficulty,
    /// New attempt override.
    #[serde(default)]
    pub max_attempts: u16,
    /// New time override.
    #[serde(default)]
    pub time_allowed: u32,
    /// New groups.
    pub groups: Vec<Group>,
}

impl From<&Puzzle> for PuzzleUpdate {
    fn from(puzzle: &Puzzle) -> Self {
        Self {
            id: puzzle.id,
            title: puzzle.title.clone(),
            description: puzzle.description.clone(),
            difficulty: puzzle.difficulty,
            max_attempts: puzzle.max_attempts,
            time_allowed: puzzle.time_allowed,
            groups: puzzle.groups.clone(),
        }
    }
}

/// Listing projection of a puzzle. Carries no answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PuzzleNode {
    /// Puzzle id.
    pub id: PuzzleId,
    /// Title.
    pub title: String,
    /// Difficulty.
    pub difficulty: Difficulty,
    /// Number of likes.
    pub num_likes: u64,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Author.
    pub user: Option<UserRef>,
}

impl Cursored for PuzzleNode {
    const SORT_KEYS: &'static [(&'static str, Accessor<Self>)] = &[
        ("createdAt", |node: &PuzzleNode| Some(SortValue::Time(node.created_at))),
        ("numLikes", |node: &PuzzleNode| Some(SortValue::Unsigned(node.num_likes))),
        ("title", |node: &PuzzleNode| Some(SortValue::Text(node.title.clone()))),
    ];
}

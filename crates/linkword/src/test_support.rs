//! Fixtures shared by unit tests.

use chrono::Utc;

use crate::game::Game;
use crate::ids::{BlockId, GroupId, PuzzleId, UserRef};
use crate::puzzle::{Block, Difficulty, Group, Puzzle};

pub(crate) fn author() -> UserRef {
    UserRef::new("author", "Author")
}

pub(crate) fn player() -> UserRef {
    UserRef::new("player", "Player")
}

/// A valid Easy puzzle by [`author`] with no overrides.
pub(crate) fn sample_puzzle() -> Puzzle {
    let now = Utc::now();
    let groups = (0..4)
        .map(|g| {
            let blocks = (0..4)
                .map(|b| Block::new(BlockId::generate(), format!("block {g}{b}")))
                .collect();
            Group::new(
                GroupId::generate(),
                vec![format!("connection {g}"), format!("link {g}")],
                blocks,
            )
        })
        .collect();
    Puzzle {
        id: PuzzleId::generate(),
        title: "Sample".to_string(),
        description: None,
        difficulty: Difficulty::Easy,
        max_attempts: 0,
        time_allowed: 0,
        groups,
        num_likes: 0,
        liked: false,
        created_at: now,
        updated_at: now,
        user: Some(author()),
    }
}

/// A fresh game of [`sample_puzzle`] played by [`player`].
pub(crate) fn sample_game() -> Game {
    Game::new(sample_puzzle(), Some(player()))
}

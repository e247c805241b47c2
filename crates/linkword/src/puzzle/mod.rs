//! Puzzles: four hidden groups of four blocks.

mod authoring;
mod error;
mod service;
mod types;

pub use error::PuzzleError;
pub use service::PuzzleService;
pub use types::{
    BLOCKS_PER_GROUP, Block, Difficulty, GROUP_COUNT, Group, MAX_ANSWERS, NewGroup, NewPuzzle,
    Puzzle, PuzzleNode, PuzzleUpdate,
};

//! Games: the two-phase play session of a puzzle.

mod challenge;
mod error;
mod lifecycle;
mod service;
mod types;

pub use error::GameError;
pub use lifecycle::{CompleteContract, Contract, GuessContract};
pub use service::GameService;
pub use types::{Config, Game, GameNode, GameResult, GameSummary, GameUpdate};

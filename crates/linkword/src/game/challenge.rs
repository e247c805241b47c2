//! Challenge chains: replaying another player's game.

use tracing::{debug, instrument};

use super::{Game, GameSummary};
use crate::ids::UserRef;

impl Game {
    /// Root of the chain this game belongs to: whoever it was challenged
    /// by, or the game itself.
    pub fn chain_head(&self) -> GameSummary {
        self.challenged_by
            .clone()
            .unwrap_or_else(|| self.summary())
    }

    /// Creates a game replaying `ancestor` for `user`.
    ///
    /// The new game plays the same puzzle with the ancestor's budget and is
    /// linked to the root of the ancestor's chain, so chains stay one level
    /// deep however often they are forked.
    #[instrument(skip(ancestor, user), fields(ancestor_id = %ancestor.id))]
    pub fn challenge(ancestor: &Game, user: Option<UserRef>) -> Game {
        let mut game = Game::new(ancestor.puzzle.clone(), user);
        game.config = ancestor.config;
        game.challenged_by = Some(ancestor.chain_head());
        debug!(
            game_id = %game.id,
            root_id = ?game.challenged_by.as_ref().map(|head| head.id),
            "Challenge derived"
        );
        game
    }
}

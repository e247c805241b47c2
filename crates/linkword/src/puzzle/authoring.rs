//! Writing and revising puzzles.

use chrono::Utc;
use tracing::{info, instrument, warn};

use super::{Block, Group, NewPuzzle, Puzzle, PuzzleError, PuzzleUpdate};
use crate::Error;
use crate::ids::{BlockId, GroupId, PuzzleId, UserRef};
use crate::sanitize::Sanitizer;
use crate::validation::{Guarded, UpdateGate, Violations, validate_puzzle};

fn clean_description(description: Option<String>, sanitizer: &dyn Sanitizer) -> Option<String> {
    description
        .map(|text| sanitizer.sanitize(&text))
        .filter(|text| !text.is_empty())
}

fn clean_all(values: Vec<String>, sanitizer: &dyn Sanitizer) -> Vec<String> {
    values.iter().map(|v| sanitizer.sanitize(v)).collect()
}

impl Puzzle {
    /// Builds a puzzle from an author's submission.
    ///
    /// Text is sanitized and ids are assigned. The result is not yet
    /// validated.
    #[instrument(skip(new, author, sanitizer), fields(author = %author.id))]
    pub fn author(new: NewPuzzle, author: UserRef, sanitizer: &dyn Sanitizer) -> Self {
        let now = Utc::now();
        let groups = new
            .groups
            .into_iter()
            .map(|group| {
                let blocks = group
                    .blocks
                    .iter()
                    .map(|value| Block::new(BlockId::generate(), sanitizer.sanitize(value)))
                    .collect();
                Group::new(
                    GroupId::generate(),
                    clean_all(group.answers, sanitizer),
                    blocks,
                )
            })
            .collect();

        Self {
            id: PuzzleId::generate(),
            title: sanitizer.sanitize(&new.title),
            description: clean_description(new.description, sanitizer),
            difficulty: new.difficulty,
            max_attempts: new.max_attempts,
            time_allowed: new.time_allowed,
            groups,
            num_likes: 0,
            liked: false,
            created_at: now,
            updated_at: now,
            user: Some(author),
        }
    }

    /// Returns true if `other` plays exactly like `self`.
    pub fn same_configuration(&self, other: &Puzzle) -> bool {
        self.difficulty == other.difficulty
            && self.max_attempts == other.max_attempts
            && self.time_allowed == other.time_allowed
            && self.groups == other.groups
    }

    /// Applies an author's revision.
    ///
    /// Once the puzzle has been `played` only the title and description may
    /// change.
    ///
    /// # Errors
    ///
    /// Gate errors for identity, ownership or invariant failures, and
    /// [`PuzzleError::ConfigLocked`] for configuration changes to a played
    /// puzzle.
    #[instrument(skip(self, update, actor, sanitizer), fields(puzzle_id = %self.id))]
    pub fn revise(
        &self,
        update: PuzzleUpdate,
        actor: Option<&UserRef>,
        played: bool,
        sanitizer: &dyn Sanitizer,
    ) -> Result<Puzzle, Error> {
        let gate = UpdateGate::new(self, actor);
        gate.admit(&update)?;

        let update = PuzzleUpdate {
            title: sanitizer.sanitize(&update.title),
            description: clean_description(update.description, sanitizer),
            groups: update
                .groups
                .into_iter()
                .map(|group| Group {
                    answers: clean_all(group.answers, sanitizer),
                    blocks: group
                        .blocks
                        .into_iter()
                        .map(|block| Block::new(block.id, sanitizer.sanitize(&block.value)))
                        .collect(),
                    ..group
                })
                .collect(),
            ..update
        };

        let candidate = gate.strip(update);
        if played && !candidate.same_configuration(self) {
            warn!("Configuration change to a played puzzle");
            return Err(PuzzleError::ConfigLocked.into());
        }

        let candidate = gate.commit(candidate)?;
        info!(title = %candidate.title, "Puzzle revised");
        Ok(candidate)
    }
}

impl Guarded for Puzzle {
    type Id = PuzzleId;
    type Update = PuzzleUpdate;

    fn guard_id(&self) -> PuzzleId {
        self.id
    }

    fn update_id(update: &PuzzleUpdate) -> PuzzleId {
        update.id
    }

    fn is_terminal(&self) -> bool {
        false
    }

    fn owner(&self) -> Option<&UserRef> {
        self.user.as_ref()
    }

    fn check(&self) -> Result<(), Violations> {
        validate_puzzle(self)
    }

    fn strip(&self, update: PuzzleUpdate) -> Self {
        Self {
            id: self.id,
            title: update.title,
            description: update.description,
            difficulty: update.difficulty,
            max_attempts: update.max_attempts,
            time_allowed: update.time_allowed,
            groups: update.groups,
            num_likes: self.num_likes,
            liked: self.liked,
            created_at: self.created_at,
            updated_at: Utc::now(),
            user: self.user.clone(),
        }
    }
}

//! Shared handler state.

use derive_getters::Getters;
use derive_new::new;
use linkword::{
    GameRepository, GameService, PuzzleRepository, PuzzleService, Sanitizer, TextSanitizer,
};
use std::sync::Arc;
use tracing::{info, instrument};

use super::error::ApiError;

/// Services shared by all handlers. Cheap to clone.
#[derive(Debug, Clone, Getters, new)]
pub struct AppState {
    /// Game lifecycle.
    games: GameService,
    /// Puzzle authoring, listing and likes.
    puzzles: PuzzleService,
}

impl AppState {
    /// Builds both services over one repository and one sanitizer.
    #[instrument(skip_all)]
    pub fn from_repository<R>(repository: R, sanitizer: TextSanitizer) -> Self
    where
        R: GameRepository + PuzzleRepository + 'static,
    {
        let repository = Arc::new(repository);
        let sanitizer: Arc<dyn Sanitizer> = Arc::new(sanitizer);
        info!("Application state ready");
        Self::new(
            GameService::new(repository.clone(), sanitizer.clone()),
            PuzzleService::new(repository, sanitizer),
        )
    }
}

/// Runs a synchronous engine call on the blocking pool.
pub async fn blocking<T, F>(call: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, linkword::Error> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(call)
        .await
        .map_err(|e| ApiError::Worker(e.to_string()))?
        .map_err(ApiError::from)
}

//! Puzzle endpoints.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use linkword::{
    Connection, Game, NewPuzzle, PageRequest, Puzzle, PuzzleId, PuzzleNode, PuzzleUpdate,
};
use tracing::{info, instrument};

use super::error::ApiError;
use super::state::{AppState, blocking};
use super::viewer::Viewer;

/// `POST /puzzles`
#[instrument(skip(state, viewer, new), fields(title = %new.title))]
pub async fn create(
    State(state): State<AppState>,
    viewer: Viewer,
    Json(new): Json<NewPuzzle>,
) -> Result<(StatusCode, Json<Puzzle>), ApiError> {
    let puzzles = state.puzzles().clone();
    let puzzle = blocking(move || puzzles.create(new, viewer.0)).await?;
    info!(puzzle_id = %puzzle.id, "Puzzle published");
    Ok((StatusCode::CREATED, Json(puzzle)))
}

/// `GET /puzzles`
#[instrument(skip(state, viewer))]
pub async fn list(
    State(state): State<AppState>,
    viewer: Viewer,
    Query(request): Query<PageRequest>,
) -> Result<Json<Connection<PuzzleNode>>, ApiError> {
    let puzzles = state.puzzles().clone();
    let page = blocking(move || puzzles.list(&request, viewer.user())).await?;
    Ok(Json(page))
}

/// `GET /puzzles/{id}`
#[instrument(skip(state, viewer))]
pub async fn get(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<PuzzleId>,
) -> Result<Json<Puzzle>, ApiError> {
    let puzzles = state.puzzles().clone();
    let puzzle = blocking(move || puzzles.get(id, viewer.user())).await?;
    Ok(Json(puzzle))
}

/// `PUT /puzzles/{id}`
#[instrument(skip(state, viewer, update))]
pub async fn update(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<PuzzleId>,
    Json(update): Json<PuzzleUpdate>,
) -> Result<Json<Puzzle>, ApiError> {
    let puzzles = state.puzzles().clone();
    let puzzle = blocking(move || puzzles.update(id, update, viewer.user())).await?;
    Ok(Json(puzzle))
}

/// `POST /puzzles/{id}/like`
#[instrument(skip(state, viewer))]
pub async fn like(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<PuzzleId>,
) -> Result<Json<Puzzle>, ApiError> {
    let puzzles = state.puzzles().clone();
    let puzzle = blocking(move || puzzles.like(id, viewer.user())).await?;
    Ok(Json(puzzle))
}

/// `POST /puzzles/{id}/games`: starts a new game of the puzzle.
#[instrument(skip(state, viewer))]
pub async fn play(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<PuzzleId>,
) -> Result<(StatusCode, Json<Game>), ApiError> {
    let puzzles = state.puzzles().clone();
    let games = state.games().clone();
    let game = blocking(move || {
        let puzzle = puzzles.get(id, viewer.user())?;
        games.create(puzzle, viewer.0)
    })
    .await?;
    info!(game_id = %game.id, "Game started");
    Ok((StatusCode::CREATED, Json(game)))
}

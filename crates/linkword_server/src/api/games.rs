//! Game endpoints.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use linkword::{ChallengeCode, Connection, Game, GameId, GameNode, GameUpdate, PageRequest, UserId};
use tracing::{info, instrument};

use super::error::ApiError;
use super::state::{AppState, blocking};
use super::viewer::Viewer;

/// `GET /games/{id}`
#[instrument(skip(state, viewer))]
pub async fn get(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<GameId>,
) -> Result<Json<Game>, ApiError> {
    let games = state.games().clone();
    let game = blocking(move || games.find(id, viewer.user())).await?;
    Ok(Json(game))
}

/// `PUT /games/{id}/guess`: closes the linking phase.
#[instrument(skip(state, viewer, update))]
pub async fn guess(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<GameId>,
    Json(update): Json<GameUpdate>,
) -> Result<Json<Game>, ApiError> {
    let games = state.games().clone();
    let game = blocking(move || games.guess(id, update, viewer.user())).await?;
    info!(score = game.score, "Guess recorded");
    Ok(Json(game))
}

/// `PUT /games/{id}/complete`: records the connection guesses.
#[instrument(skip(state, viewer, update))]
pub async fn complete(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<GameId>,
    Json(update): Json<GameUpdate>,
) -> Result<Json<Game>, ApiError> {
    let games = state.games().clone();
    let game = blocking(move || games.complete(id, update, viewer.user())).await?;
    info!(score = game.score, "Game completed");
    Ok(Json(game))
}

/// `POST /challenges/{code}`: starts a game against an existing one.
#[instrument(skip(state, viewer))]
pub async fn challenge(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(code): Path<String>,
) -> Result<(StatusCode, Json<Game>), ApiError> {
    let games = state.games().clone();
    let code = ChallengeCode::new(code);
    let game = blocking(move || games.challenge(&code, viewer.0)).await?;
    info!(game_id = %game.id, "Challenge accepted");
    Ok((StatusCode::CREATED, Json(game)))
}

/// `GET /users/{id}/games`: completed games of a user.
#[instrument(skip(state, viewer))]
pub async fn played(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(user): Path<String>,
    Query(request): Query<PageRequest>,
) -> Result<Json<Connection<GameNode>>, ApiError> {
    let games = state.games().clone();
    let user = UserId::new(user);
    let page = blocking(move || games.played(&request, &user, viewer.user())).await?;
    Ok(Json(page))
}

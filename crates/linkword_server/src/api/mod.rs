//! HTTP surface of the puzzle engine.
//!
//! Handlers are thin: they extract the caller, hand the call to the engine
//! on the blocking pool and map failures through [`ApiError`].

mod error;
mod games;
mod puzzles;
mod state;
mod viewer;

pub use error::ApiError;
pub use state::{AppState, blocking};
pub use viewer::{USER_ID_HEADER, USER_NAME_HEADER, Viewer};

use axum::Router;
use axum::body::Body;
use axum::http::Request;
use axum::routing::{get, post, put};
use tower::ServiceBuilder;
use tracing::info;

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/puzzles", post(puzzles::create).get(puzzles::list))
        .route("/puzzles/{id}", get(puzzles::get).put(puzzles::update))
        .route("/puzzles/{id}/like", post(puzzles::like))
        .route("/puzzles/{id}/games", post(puzzles::play))
        .route("/games/{id}", get(games::get))
        .route("/games/{id}/guess", put(games::guess))
        .route("/games/{id}/complete", put(games::complete))
        .route("/challenges/{code}", post(games::challenge))
        .route("/users/{id}/games", get(games::played))
        .layer(ServiceBuilder::new().map_request(|req: Request<Body>| {
            info!(method = %req.method(), uri = %req.uri(), "Incoming HTTP request");
            req
        }))
        .with_state(state)
}

//! Linkword server - HTTP API and SQLite persistence for the linkword engine.
//!
//! The [`linkword`] crate owns the game rules; this crate stores puzzles and
//! games with diesel and exposes the engine over axum.
//!
//! # Example
//!
//! ```no_run
//! use linkword::TextSanitizer;
//! use linkword_server::{AppState, SqliteRepository, router, run_migrations};
//!
//! # async fn serve() -> anyhow::Result<()> {
//! run_migrations("linkword.db")?;
//! let repository = SqliteRepository::new("linkword.db".to_string())?;
//! let app = router(AppState::from_repository(repository, TextSanitizer::default()));
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod api;
mod config;
mod db;

// Crate-level exports - HTTP
pub use api::{
    ApiError, AppState, USER_ID_HEADER, USER_NAME_HEADER, Viewer, blocking, router,
};

// Crate-level exports - Configuration
pub use config::{ConfigError, ServerConfig};

// Crate-level exports - Persistence
pub use db::{DbError, MIGRATIONS, SqliteRepository, run_migrations};

//! Linkword server - unified CLI
//!
//! Serves the puzzle API or prepares its database.

#![warn(missing_docs)]

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use linkword::TextSanitizer;
use linkword_server::{AppState, ServerConfig, SqliteRepository, router, run_migrations};
use tracing::{info, instrument};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match cli.command {
        Command::Migrate => migrate(&config),
        Command::Serve { port, host } => serve(config.with_address(host, port)).await,
    }
}

/// Layers the config file, `DATABASE_URL` and `--db-path`.
fn load_config(cli: &Cli) -> Result<ServerConfig> {
    let mut config = match &cli.config {
        Some(path) => ServerConfig::from_file(path)?,
        None => ServerConfig::default(),
    };
    if let Ok(database) = std::env::var("DATABASE_URL") {
        config = config.with_database(database);
    }
    if let Some(database) = &cli.db_path {
        config = config.with_database(database.clone());
    }
    Ok(config)
}

/// Apply pending migrations and exit
#[instrument(skip(config), fields(database = %config.database()))]
fn migrate(config: &ServerConfig) -> Result<()> {
    let applied = run_migrations(config.database())?;
    info!(applied, "Database up to date");
    Ok(())
}

/// Run the HTTP server
#[instrument(skip(config), fields(database = %config.database()))]
async fn serve(config: ServerConfig) -> Result<()> {
    run_migrations(config.database())?;

    let repository = SqliteRepository::new(config.database().clone())?;
    let sanitizer = TextSanitizer::new(config.banned_words().iter().cloned());
    let app = router(AppState::from_repository(repository, sanitizer));

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!(address = %address, "Server ready");
    axum::serve(listener, app).await?;

    Ok(())
}

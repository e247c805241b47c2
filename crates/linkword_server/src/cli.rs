//! Command-line interface for linkword_server.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Linkword - word-association puzzle server
#[derive(Parser, Debug)]
#[command(name = "linkword_server")]
#[command(about = "HTTP server for the linkword puzzle game", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to a TOML config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the database file (overrides config and DATABASE_URL)
    #[arg(long, global = true)]
    pub db_path: Option<String>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP server, applying pending migrations first
    Serve {
        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,
    },

    /// Apply pending database migrations and exit
    Migrate,
}

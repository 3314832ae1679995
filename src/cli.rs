//! Command-line interface for scorekeep.

use clap::{Parser, Subcommand};

/// Scorekeep - score tracking backend for games
#[derive(Parser, Debug)]
#[command(name = "scorekeep")]
#[command(about = "Records player scores, game sessions and high scores", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP server
    Serve {
        /// TOML config file
        #[arg(short, long)]
        config: Option<std::path::PathBuf>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,

        /// Path to the database file (created if it doesn't exist)
        #[arg(long)]
        db_path: Option<String>,

        /// Serve the in-memory last-write-wins board instead of the database
        #[arg(long)]
        legacy: bool,
    },

    /// Apply pending database migrations and exit
    Migrate {
        /// TOML config file
        #[arg(short, long)]
        config: Option<std::path::PathBuf>,

        /// Path to the database file (created if it doesn't exist)
        #[arg(long)]
        db_path: Option<String>,
    },
}

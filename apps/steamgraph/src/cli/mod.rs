//! # SteamGraph CLI Module
//!
//! This module implements the CLI interface for SteamGraph.
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server (optionally seeding from a CSV first)
//! - `ingest` - Import a games CSV into the database
//! - `games` - List games
//! - `game` - Show one game with its publishers, genres and tags
//! - `similar` - Games sharing the most tags with a game
//! - `publisher` - Games of a publisher
//! - `category` - Games of a genre
//! - `status` - Show graph status
//! - `init` - Initialize a new database

mod commands;

use crate::config::AppConfig;
use crate::error::AppError;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// SteamGraph - games, publishers, genres and tags as a queryable graph.
#[derive(Parser, Debug)]
#[command(name = "steamgraph")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the graph database (overrides configuration)
    #[arg(short = 'D', long, global = true)]
    pub database: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to (overrides configuration)
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to (overrides configuration)
        #[arg(short, long)]
        port: Option<u16>,

        /// Ingest this CSV before serving
        #[arg(long)]
        seed: Option<PathBuf>,
    },

    /// Import a games CSV file
    Ingest {
        /// Path to the CSV file
        #[arg(short, long)]
        file: PathBuf,

        /// Keep only the N most-owned games (overrides configuration)
        #[arg(short = 'n', long)]
        max_rows: Option<usize>,
    },

    /// List games in storage order
    Games {
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Show one game by AppID
    Game { id: String },

    /// Games sharing the most tags with a game
    Similar { id: String },

    /// Games of a publisher (name matched ignoring case)
    Publisher {
        name: String,

        #[arg(short, long, default_value = "50")]
        limit: usize,
    },

    /// Games of a genre (name matched ignoring case)
    Category {
        name: String,

        #[arg(short, long, default_value = "50")]
        limit: usize,
    },

    /// Show graph status
    Status,

    /// Initialize a new empty database
    Init {
        /// Replace an existing database
        #[arg(short, long)]
        force: bool,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), AppError> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(database) = cli.database {
        config.storage.database = database;
    }
    let json = cli.json;

    match cli.command {
        Some(Commands::Server { host, port, seed }) => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            cmd_server(&config, seed.as_deref()).await
        }
        Some(Commands::Ingest { file, max_rows }) => {
            if let Some(max_rows) = max_rows {
                config.ingest.max_rows = max_rows;
            }
            cmd_ingest(&config, json, &file)
        }
        Some(Commands::Games { limit }) => cmd_games(&config, json, limit),
        Some(Commands::Game { id }) => cmd_game(&config, json, &id),
        Some(Commands::Similar { id }) => cmd_similar(&config, json, &id),
        Some(Commands::Publisher { name, limit }) => cmd_publisher(&config, json, &name, limit),
        Some(Commands::Category { name, limit }) => cmd_category(&config, json, &name, limit),
        Some(Commands::Init { force }) => cmd_init(&config, force),
        // No subcommand - show status by default
        Some(Commands::Status) | None => cmd_status(&config, json),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_ingest_with_ceiling() {
        let cli = Cli::try_parse_from(["steamgraph", "ingest", "-f", "games.csv", "-n", "1000"])
            .expect("valid args");
        assert!(matches!(
            cli.command,
            Some(Commands::Ingest { ref file, max_rows: Some(1000) }) if file.as_path() == std::path::Path::new("games.csv")
        ));
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["steamgraph", "similar", "730", "--json", "-D", "x.redb"])
            .expect("valid args");
        assert!(cli.json);
        assert_eq!(cli.database, Some(PathBuf::from("x.redb")));
    }
}

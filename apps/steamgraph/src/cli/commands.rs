//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands. Every
//! command opens the redb database named by the configuration.

use crate::api;
use crate::config::AppConfig;
use crate::error::AppError;
use serde::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use steamgraph_core::{GameSummary, Session};

// =============================================================================
// HELPERS
// =============================================================================

fn open_session(config: &AppConfig) -> Result<Session, AppError> {
    tracing::debug!(database = %config.storage.database.display(), "opening database");
    Ok(Session::with_redb(&config.storage.database)?)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| AppError::Io(format!("JSON encoding failed: {e}")))?;
    println!("{}", text);
    Ok(())
}

fn print_games(games: &[GameSummary]) {
    if games.is_empty() {
        println!("(no games)");
        return;
    }
    for game in games {
        println!(
            "{:>10}  {:<40}  owners <= {:<11}  ${:.2}",
            game.id, game.name, game.estimated_owners, game.price
        );
    }
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server, optionally ingesting `seed` first.
pub async fn cmd_server(config: &AppConfig, seed: Option<&Path>) -> Result<(), AppError> {
    let mut session = open_session(config)?;

    if let Some(seed) = seed {
        let summary = session.ingest_path(seed, &config.ingest)?;
        tracing::info!(ingested = summary.ingested, "seeded database from {}", seed.display());
    }

    println!("SteamGraph Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Address:  {}", config.server.addr());
    println!("  Database: {}", config.storage.database.display());
    println!();
    println!("Endpoints:");
    println!("  GET /health");
    println!("  GET /api/status");
    println!("  GET /api/games?limit=20");
    println!("  GET /api/games/{{id}}");
    println!("  GET /api/games/{{id}}/similar");
    println!("  GET /api/publishers/{{name}}/games?limit=50");
    println!("  GET /api/categories/{{name}}/games?limit=50");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    api::run_server(config, session).await
}

// =============================================================================
// INGEST COMMAND
// =============================================================================

/// Import a CSV file, printing progress every batch.
pub fn cmd_ingest(config: &AppConfig, json: bool, file: &Path) -> Result<(), AppError> {
    let path = validate_file_path(file)?;
    let mut session = open_session(config)?;

    let source = File::open(&path)
        .map_err(|e| AppError::Io(format!("Cannot open '{}': {e}", path.display())))?;

    if json {
        // stdout carries only the summary; progress stays in the log.
        let summary = session.ingest(source, &config.ingest)?;
        return print_json(&summary);
    }

    println!("Ingesting {} (keeping top {})", path.display(), config.ingest.max_rows);
    let summary = session.ingest_with_progress(source, &config.ingest, |n| {
        println!("  ingested {n} games...");
    })?;

    let metrics = session.metrics()?;
    println!();
    println!("Rows read:    {}", summary.read);
    println!("Rows kept:    {}", summary.kept);
    println!("Ingested:     {}", summary.ingested);
    println!("Skipped:      {}", summary.skipped);
    println!("New links:    {}", summary.relationships);
    println!();
    println!(
        "Graph now has {} games, {} publishers, {} genres, {} tags, {} relationships",
        metrics.games, metrics.publishers, metrics.genres, metrics.tags, metrics.relationships
    );
    Ok(())
}

/// Resolve `path` and make sure it names a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, AppError> {
    let canonical = path.canonicalize().map_err(|e| {
        AppError::Io(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(AppError::Io(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

// =============================================================================
// QUERY COMMANDS
// =============================================================================

pub fn cmd_games(config: &AppConfig, json: bool, limit: usize) -> Result<(), AppError> {
    let games = open_session(config)?.list_games(limit)?;
    if json {
        return print_json(&serde_json::json!({ "games": games }));
    }
    print_games(&games);
    Ok(())
}

pub fn cmd_game(config: &AppConfig, json: bool, id: &str) -> Result<(), AppError> {
    let detail = open_session(config)?.game_detail(id)?;
    if json {
        return print_json(&serde_json::json!({ "game": detail }));
    }

    let game = &detail.game;
    println!("{} (AppID {})", game.name, game.id);
    println!("  Released:      {}", game.release_date);
    println!("  Owners (max):  {}", game.estimated_owners);
    println!("  Required age:  {}", game.required_age);
    println!("  Price:         ${:.2}", game.price);
    println!("  Publishers:    {}", detail.publishers.join(", "));
    println!("  Genres:        {}", detail.genres.join(", "));
    println!("  Tags:          {}", detail.tags.join(", "));
    Ok(())
}

pub fn cmd_similar(config: &AppConfig, json: bool, id: &str) -> Result<(), AppError> {
    let similar = open_session(config)?.similar_games(id)?;
    if json {
        return print_json(&similar);
    }
    if similar.is_empty() {
        println!("No games share a tag with {}", id);
        return Ok(());
    }
    for entry in &similar {
        println!("{:>3}  {}", entry.score, entry.name);
    }
    Ok(())
}

pub fn cmd_publisher(
    config: &AppConfig,
    json: bool,
    name: &str,
    limit: usize,
) -> Result<(), AppError> {
    let result = open_session(config)?.games_by_publisher(name, limit)?;
    if json {
        return print_json(&result);
    }
    println!("Publisher: {}", result.publisher);
    print_games(&result.games);
    Ok(())
}

pub fn cmd_category(
    config: &AppConfig,
    json: bool,
    name: &str,
    limit: usize,
) -> Result<(), AppError> {
    let result = open_session(config)?.games_by_category(name, limit)?;
    if json {
        return print_json(&result);
    }
    println!("Category: {}", result.category);
    print_games(&result.games);
    Ok(())
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

pub fn cmd_status(config: &AppConfig, json: bool) -> Result<(), AppError> {
    let session = open_session(config)?;
    let metrics = session.metrics()?;

    if json {
        return print_json(&api::StatusResponse::new(&metrics, session.is_persistent()));
    }

    println!("SteamGraph Status");
    println!("=================");
    println!("Database:      {}", config.storage.database.display());
    println!();
    println!("Games:         {}", metrics.games);
    println!("Publishers:    {}", metrics.publishers);
    println!("Genres:        {}", metrics.genres);
    println!("Tags:          {}", metrics.tags);
    println!("Relationships: {}", metrics.relationships);
    Ok(())
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Create an empty database. Refuses to touch an existing one unless forced.
pub fn cmd_init(config: &AppConfig, force: bool) -> Result<(), AppError> {
    let path = &config.storage.database;

    if path.exists() {
        if !force {
            return Err(AppError::Usage(format!(
                "Database {} already exists (use --force to replace it)",
                path.display()
            )));
        }
        std::fs::remove_file(path)
            .map_err(|e| AppError::Io(format!("Cannot remove {}: {e}", path.display())))?;
        tracing::warn!("Removed existing database {}", path.display());
    }

    open_session(config)?;
    println!("Initialized empty database at {}", path.display());
    Ok(())
}

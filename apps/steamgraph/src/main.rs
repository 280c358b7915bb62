//! # SteamGraph Server
//!
//! The main binary for SteamGraph.
//!
//! This application provides:
//! - HTTP REST API server (axum-based, read-only)
//! - CSV importer for the games dataset
//! - CLI access to every query
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────┐
//! │               apps/steamgraph (THE BINARY)            │
//! │                                                       │
//! │   ┌─────────────┐   ┌─────────────┐   ┌───────────┐   │
//! │   │    CLI      │   │  HTTP API   │   │  Config   │   │
//! │   │   (clap)    │   │   (axum)    │   │  (toml)   │   │
//! │   └──────┬──────┘   └──────┬──────┘   └─────┬─────┘   │
//! │          └─────────────────┼────────────────┘         │
//! │                            ▼                          │
//! │                  ┌──────────────────┐                 │
//! │                  │ steamgraph-core  │                 │
//! │                  └──────────────────┘                 │
//! └───────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Import the top 500 games, then serve
//! steamgraph ingest --file games.csv
//! steamgraph server --port 8080
//!
//! # Queries from the command line
//! steamgraph similar 730
//! steamgraph publisher valve --limit 10
//! ```

use clap::Parser;
use steamgraph::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // STEAMGRAPH_LOG_FORMAT=json enables machine-parseable output.
    let log_format =
        std::env::var("STEAMGRAPH_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "steamgraph=info,steamgraph_core=info,tower_http=debug".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

//! # API Request/Response Types
//!
//! JSON envelopes of the HTTP API. The records inside them come from
//! `steamgraph_core::query`.

use serde::{Deserialize, Serialize};
use steamgraph_core::{GameDetail, GameSummary, GraphMetrics};

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// STATUS RESPONSE
// =============================================================================

/// Graph status response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub persistent: bool,
    pub node_count: usize,
    pub relationship_count: usize,
    pub games: usize,
    pub publishers: usize,
    pub genres: usize,
    pub tags: usize,
}

impl StatusResponse {
    #[must_use]
    pub fn new(metrics: &GraphMetrics, persistent: bool) -> Self {
        Self {
            persistent,
            node_count: metrics.nodes(),
            relationship_count: metrics.relationships,
            games: metrics.games,
            publishers: metrics.publishers,
            genres: metrics.genres,
            tags: metrics.tags,
        }
    }
}

// =============================================================================
// QUERY PARAMETERS
// =============================================================================

/// `?limit=N` on list endpoints. Absent means the endpoint's default.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct GamesQuery {
    pub limit: Option<usize>,
}

/// Default page size of `/api/games`.
pub const DEFAULT_GAMES_LIMIT: usize = 20;

/// Default page size of the publisher and category listings.
pub const DEFAULT_LINKED_GAMES_LIMIT: usize = 50;

// =============================================================================
// GAME RESPONSES
// =============================================================================

/// `{games: [...]}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GamesResponse {
    pub games: Vec<GameSummary>,
}

/// `{game: {...}}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameDetailResponse {
    pub game: GameDetail,
}

// =============================================================================
// ERROR RESPONSE
// =============================================================================

/// Body of every non-2xx response produced by a handler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

//! # API Endpoint Handlers
//!
//! Thin transport: extract parameters, take a read lock on the session, call
//! one query, and map the outcome to a status code.

use super::{
    AppState,
    types::{
        DEFAULT_GAMES_LIMIT, DEFAULT_LINKED_GAMES_LIMIT, ErrorResponse, GameDetailResponse,
        GamesQuery, GamesResponse, HealthResponse, StatusResponse,
    },
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use steamgraph_core::GraphError;

// =============================================================================
// ERROR MAPPING
// =============================================================================

/// Map a core error to an HTTP status.
///
/// NotFound → 404, InvalidArgument → 400, everything else → 500.
fn status_for(error: &GraphError) -> StatusCode {
    match error {
        GraphError::NotFound { .. } => StatusCode::NOT_FOUND,
        GraphError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(error: &GraphError) -> Response {
    let status = status_for(error);
    if status.is_server_error() {
        tracing::error!(error = %error, "query failed");
    }
    (status, Json(ErrorResponse::new(error.to_string()))).into_response()
}

fn respond<T: Serialize>(result: Result<T, GraphError>) -> Response {
    match result {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(e) => error_response(&e),
    }
}

// =============================================================================
// HEALTH & STATUS
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

/// Node counts per label.
pub async fn status_handler(State(state): State<AppState>) -> Response {
    let session = state.session.read().await;
    respond(
        session
            .metrics()
            .map(|m| StatusResponse::new(&m, session.is_persistent())),
    )
}

// =============================================================================
// GAMES
// =============================================================================

/// `GET /api/games?limit=20`
pub async fn list_games_handler(
    State(state): State<AppState>,
    Query(query): Query<GamesQuery>,
) -> Response {
    let limit = query.limit.unwrap_or(DEFAULT_GAMES_LIMIT);
    let session = state.session.read().await;
    respond(session.list_games(limit).map(|games| GamesResponse { games }))
}

/// `GET /api/games/{id}`
pub async fn game_detail_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    let session = state.session.read().await;
    respond(session.game_detail(&id).map(|game| GameDetailResponse { game }))
}

/// `GET /api/games/{id}/similar`
pub async fn similar_games_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    let session = state.session.read().await;
    respond(session.similar_games(&id))
}

// =============================================================================
// PUBLISHERS & CATEGORIES
// =============================================================================

/// `GET /api/publishers/{name}/games?limit=50`
pub async fn publisher_games_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<GamesQuery>,
) -> Response {
    let limit = query.limit.unwrap_or(DEFAULT_LINKED_GAMES_LIMIT);
    let session = state.session.read().await;
    respond(session.games_by_publisher(&name, limit))
}

/// `GET /api/categories/{name}/games?limit=50`
pub async fn category_games_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<GamesQuery>,
) -> Response {
    let limit = query.limit.unwrap_or(DEFAULT_LINKED_GAMES_LIMIT);
    let session = state.session.read().await;
    respond(session.games_by_category(&name, limit))
}

// =============================================================================
// TESTS
// =============================================================================

//! # SteamGraph HTTP API Module
//!
//! This module implements the read-only HTTP REST API using axum.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check (never authenticated)
//! - `GET /api/status` - Node counts per label
//! - `GET /api/games?limit=20` - List games
//! - `GET /api/games/{id}` - Game detail
//! - `GET /api/games/{id}/similar` - Games sharing the most tags
//! - `GET /api/publishers/{name}/games?limit=50` - Games of a publisher
//! - `GET /api/categories/{name}/games?limit=50` - Games of a genre
//!
//! ## Security Configuration
//!
//! Taken from [`AppConfig`]: Basic credentials, CORS origins, and the global
//! rate limit.

mod auth;
mod handlers;
mod middleware;
mod types;

pub use auth::{BasicCredentials, basic_auth_middleware};
pub use middleware::{GlobalRateLimiter, create_rate_limiter, rate_limit_middleware};
pub use types::{
    ErrorResponse, GameDetailResponse, GamesQuery, GamesResponse, HealthResponse, StatusResponse,
};

use crate::config::{AppConfig, CorsConfig};
use crate::error::AppError;
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::get,
};
use std::sync::Arc;
use steamgraph_core::Session;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state containing the graph session.
#[derive(Clone)]
pub struct AppState {
    /// The session containing the graph. Handlers only take read locks.
    pub session: Arc<RwLock<Session>>,
}

impl AppState {
    /// Create new app state with a session.
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self {
            session: Arc::new(RwLock::new(session)),
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build the CORS layer from configuration.
///
/// - `["*"]`: allows all origins (development only)
/// - empty: localhost only
/// - otherwise: the listed origins; unparsable entries are dropped
fn build_cors_layer(config: &CorsConfig) -> CorsLayer {
    if config.origins.iter().any(|o| o == "*") {
        tracing::warn!("CORS: Allowing ALL origins. This is insecure for production!");
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = config
        .origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(hv) => {
                tracing::info!("CORS: Allowing origin: {}", origin);
                Some(hv)
            }
            Err(e) => {
                tracing::warn!("CORS: Invalid origin '{}': {}", origin, e);
                None
            }
        })
        .collect();

    if allowed.is_empty() {
        tracing::info!("CORS: No origins configured, defaulting to localhost only");
        return build_localhost_cors();
    }

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// Build a restrictive CORS layer that only allows localhost origins.
fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:5173",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:5173",
    ]
    .iter()
    .filter_map(|o| o.parse::<HeaderValue>().ok())
    .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing - logs all requests
/// 2. CORS - handles preflight requests
/// 3. Rate Limiting - global requests/second (if enabled)
/// 4. Authentication - HTTP Basic (if credentials are configured)
pub fn create_router(state: AppState, config: &AppConfig) -> Router {
    let cors = build_cors_layer(&config.cors);

    let rps = config.rate_limit.requests_per_second;
    let rate_limiter = if rps > 0 {
        tracing::info!("Rate limiting enabled: {} requests/second", rps);
        Some(create_rate_limiter(rps))
    } else {
        tracing::info!("Rate limiting disabled");
        None
    };

    let credentials = BasicCredentials::from_config(&config.auth);
    if credentials.is_some() {
        tracing::info!("Basic authentication enabled");
    } else {
        tracing::warn!(
            "Basic authentication DISABLED - all endpoints are publicly accessible! \
             Set STEAMGRAPH_USERNAME and STEAMGRAPH_PASSWORD to enable it."
        );
    }

    let mut router = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/api/status", get(handlers::status_handler))
        .route("/api/games", get(handlers::list_games_handler))
        .route("/api/games/{id}", get(handlers::game_detail_handler))
        .route("/api/games/{id}/similar", get(handlers::similar_games_handler))
        .route(
            "/api/publishers/{name}/games",
            get(handlers::publisher_games_handler),
        )
        .route(
            "/api/categories/{name}/games",
            get(handlers::category_games_handler),
        );

    // Authentication runs last on the request path.
    if let Some(credentials) = credentials {
        router = router.layer(axum_middleware::from_fn_with_state(
            Arc::new(credentials),
            basic_auth_middleware,
        ));
    }

    if let Some(limiter) = rate_limiter {
        router = router.layer(axum_middleware::from_fn_with_state(
            limiter,
            rate_limit_middleware,
        ));
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server and serve until the process is interrupted.
pub async fn run_server(config: &AppConfig, session: Session) -> Result<(), AppError> {
    let addr = config.server.addr();
    let router = create_router(AppState::new(session), config);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::Io(format!("Bind failed on {addr}: {e}")))?;

    tracing::info!("SteamGraph HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::Io(format!("Server error: {e}")))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

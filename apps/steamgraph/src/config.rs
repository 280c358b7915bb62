//! # Configuration Module
//!
//! Application settings, loaded once at startup and passed explicitly to the
//! router and the ingestion pipeline.
//!
//! ## Sources (later wins)
//!
//! 1. Built-in defaults
//! 2. Optional TOML file (`--config <path>`)
//! 3. Environment variables:
//!    - `STEAMGRAPH_HOST`, `STEAMGRAPH_PORT`
//!    - `STEAMGRAPH_DATABASE`: path of the redb database
//!    - `STEAMGRAPH_MAX_ROWS`: ingestion ceiling
//!    - `STEAMGRAPH_USERNAME`, `STEAMGRAPH_PASSWORD`: Basic auth credentials
//!    - `STEAMGRAPH_CORS_ORIGINS`: comma-separated origins, or `*`
//!    - `STEAMGRAPH_RATE_LIMIT`: requests per second (0 disables)

use serde::Deserialize;
use std::path::{Path, PathBuf};
use steamgraph_core::IngestConfig;
use thiserror::Error;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {var}: {value}")]
    InvalidEnv { var: &'static str, value: String },
}

// =============================================================================
// SECTIONS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl ServerConfig {
    #[must_use]
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path of the redb database file.
    pub database: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from("steamgraph.redb"),
        }
    }
}

/// HTTP Basic credentials. Authentication is disabled unless both are set.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl AuthConfig {
    /// Both credentials, if authentication is enabled.
    #[must_use]
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(user), Some(pass)) if !user.is_empty() && !pass.is_empty() => Some((user, pass)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Allowed origins. Empty means localhost only; `["*"]` allows all.
    pub origins: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Requests per second across all clients. 0 disables limiting.
    pub requests_per_second: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 100,
        }
    }
}

// =============================================================================
// APP CONFIG
// =============================================================================

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub ingest: IngestConfig,
    pub auth: AuthConfig,
    pub cors: CorsConfig,
    pub rate_limit: RateLimitConfig,
}

impl AppConfig {
    /// Parse a TOML document. Missing sections and keys take defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load defaults, then the optional file, then the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_toml_str(&text)?
            }
            None => Self::default(),
        };
        config.apply_env(|var| std::env::var(var).ok())?;
        Ok(config)
    }

    /// Apply `STEAMGRAPH_*` overrides read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let get = |var| lookup(var).filter(|v: &String| !v.trim().is_empty());

        if let Some(host) = get("STEAMGRAPH_HOST") {
            self.server.host = host;
        }
        if let Some(port) = get("STEAMGRAPH_PORT") {
            self.server.port = parse_env("STEAMGRAPH_PORT", &port)?;
        }
        if let Some(db) = get("STEAMGRAPH_DATABASE") {
            self.storage.database = PathBuf::from(db);
        }
        if let Some(rows) = get("STEAMGRAPH_MAX_ROWS") {
            self.ingest.max_rows = parse_env("STEAMGRAPH_MAX_ROWS", &rows)?;
        }
        if let Some(user) = get("STEAMGRAPH_USERNAME") {
            self.auth.username = Some(user);
        }
        if let Some(pass) = get("STEAMGRAPH_PASSWORD") {
            self.auth.password = Some(pass);
        }
        if let Some(origins) = get("STEAMGRAPH_CORS_ORIGINS") {
            self.cors.origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(rps) = get("STEAMGRAPH_RATE_LIMIT") {
            self.rate_limit.requests_per_second = parse_env("STEAMGRAPH_RATE_LIMIT", &rps)?;
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        var,
        value: value.to_string(),
    })
}

// =============================================================================
// TESTS
// =============================================================================

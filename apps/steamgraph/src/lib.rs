//! # steamgraph
//!
//! HTTP API, CLI and configuration around `steamgraph-core`. Exposed as a
//! library so integration tests can build the router directly.

pub mod api;
pub mod cli;
pub mod config;
pub mod error;

pub use config::AppConfig;
pub use error::AppError;

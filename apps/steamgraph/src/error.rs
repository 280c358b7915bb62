//! Application-level errors: everything the CLI and server can fail with.

use crate::config::ConfigError;
use steamgraph_core::GraphError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("{0}")]
    Usage(String),
}

//! Error types for the meadow grass engine

use thiserror::Error;

/// Main error type for the engine
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    /// A chunk or draw submission asked for more instances than the
    /// instancing backend accepts in one call.
    #[error("Instancing limit exceeded: {requested} instances requested, capacity is {capacity}")]
    InstancingLimitExceeded { requested: usize, capacity: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Persistence error: {0}")]
    Persist(String),
}

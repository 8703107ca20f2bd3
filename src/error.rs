//! Error types
//!
//! The tick loop itself never returns errors; these surface only from
//! configuration loading and from the typed state-transition entry point.

use thiserror::Error;

/// Failure while loading or parsing a [`crate::GameConfig`]
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Failure of a state machine operation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FsmError {
    #[error("state '{0}' is not registered")]
    StateNotFound(String),
}

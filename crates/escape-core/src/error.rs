//! Framework error type.
//!
//! Sub-crates define their own error enums (following the same `thiserror`
//! pattern) and convert into `EscapeError` via `From` impls where it's useful
//! to bubble a lower-level error up through a higher-level API.

use thiserror::Error;

use crate::AgentId;

/// Top-level error type for `escape-core` and a common base for sub-crates.
#[derive(Debug, Error)]
pub enum EscapeError {
    #[error("agent {0} not found")]
    AgentNotFound(AgentId),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Shorthand result type for all `escape-*` crates.
pub type EscapeResult<T> = Result<T, EscapeError>;

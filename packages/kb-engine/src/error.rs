//! Typed errors for the knowledge-base engine.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.
//!
//! Only hard failures live here. An empty retrieval is a valid
//! [`Context`](crate::types::context::Context) and malformed model output is a
//! [`Structured::Malformed`](crate::pipeline::parse::Structured) value; neither is
//! an error.

use thiserror::Error;

/// Errors that can occur during engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// LLM backend unreachable, timed out, or answered with a non-2xx status
    #[error("LLM transport error: {0}")]
    Transport(String),

    /// Embedding collaborator failed
    #[error("embedding error: {0}")]
    Embedding(String),

    /// Vector index or artifact storage failed
    #[error("storage error: {0}")]
    Storage(String),

    /// Filesystem error while persisting or loading
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error on persisted data
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Missing or invalid configuration (e.g. an absent API key)
    #[error("config error: {0}")]
    Config(String),

    /// Chunk size must be at least one character
    #[error("invalid chunk size: {0}")]
    InvalidChunkSize(usize),
}

impl EngineError {
    /// Whether this error came from the LLM transport.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

impl From<reqwest::Error> for EngineError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Transport(format!("request timed out: {}", err))
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

//! Client-side error taxonomy.

use thiserror::Error;

pub type ClientResult<T> = Result<T, ClientError>;

/// Every failure is scoped to one request/response cycle.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    /// The server rejected the input (HTTP 400).
    #[error("invalid request: {0}")]
    Validation(String),

    /// Unknown id (HTTP 404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Connection, timeout, server or decode failure.
    #[error("transport error: {0}")]
    Transport(String),
}

impl ClientError {
    pub(crate) fn transport(e: impl std::fmt::Display) -> Self {
        Self::Transport(e.to_string())
    }
}

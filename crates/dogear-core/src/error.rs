//! Error types for dogear-core

use thiserror::Error;

/// Result type alias using dogear-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in dogear-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Rejected highlight candidate (empty, whitespace-only, or oversized text)
    #[error("Invalid highlight: {0}")]
    Validation(String),

    /// Highlight not found in the local store
    #[error("Highlight not found: {0}")]
    NotFound(String),

    /// Invalid client configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// HTTP transport error (includes timeouts)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Remote API returned a non-success status
    #[error("Remote API error: {0}")]
    Api(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Whether this error indicates the remote collaborator is unreachable.
    ///
    /// Transport failures (connect errors, timeouts, aborts) flip the
    /// reconciliation engine's online belief; an API error means the server
    /// responded and the connection itself is fine.
    #[must_use]
    pub const fn is_connectivity(&self) -> bool {
        matches!(self, Self::Http(_))
    }
}

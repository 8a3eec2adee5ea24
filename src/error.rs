// Error types surfaced to whoever consumes a cursor

use thiserror::Error;

/// Result alias used across the crate's public API
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The execution service reported a fault (connectivity, syntax,
    /// constraint...). Passed through as-is, never retried.
    #[error(transparent)]
    Execution(#[from] anyhow::Error),

    /// A shape that needs at least one row and column got none
    #[error("query returned no rows for '{shape}' shape")]
    EmptyResult { shape: &'static str },

    /// `fetch` called again on a cursor whose query already failed
    #[error("cursor already consumed; its query failed: {0}")]
    Consumed(String),

    /// A sort direction other than ASC/DESC
    #[error("unknown sort direction: {0}")]
    UnknownDirection(String),

    /// A shape name that cannot be parsed
    #[error("unknown result shape: {0}")]
    UnknownShape(String),
}

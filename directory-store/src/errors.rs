//! Unified error types for the crate.

use thiserror::Error;

/// Top-level error for directory-store operations.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// SQLite failures (open, schema, query).
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// I/O or filesystem errors.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or unsupported configuration.
    #[error("config error: {0}")]
    Config(String),

    /// A stored row is missing a required field.
    #[error("invalid directory record #{index}: `{field}` is empty")]
    InvalidRecord { index: usize, field: &'static str },

    /// Blocking task was cancelled or panicked.
    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

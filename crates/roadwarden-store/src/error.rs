//! Error types for the store backends.

use thiserror::Error;

/// Store-wide error type.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Backing resource could not be created or opened
    #[error("store initialization failed: {0}")]
    Init(String),

    /// Backing resource is present but unreadable
    #[error("store is corrupt: {0}")]
    Corrupt(String),

    /// I/O failure against an open store
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Record could not be encoded or decoded
    #[error("store encoding error: {0}")]
    Encode(String),

    /// Operation on a store that has been closed
    #[error("store is closed")]
    Closed,
}

/// Result type alias using [`StoreError`].
pub type Result<T> = std::result::Result<T, StoreError>;

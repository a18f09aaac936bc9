//! Error types for lock-session persistence.

use thiserror::Error;

/// Errors raised by the lock-session store and its backends.
#[derive(Debug, Error)]
pub enum LockError {
    /// A session or index payload failed to serialize or parse.
    #[error("lock session payload error: {0}")]
    Payload(#[from] serde_json::Error),

    /// The backing key/value store failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Replacing a session whose id is not in the index.
    #[error("unknown lock session '{id}'")]
    UnknownSession { id: String },
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, LockError>;

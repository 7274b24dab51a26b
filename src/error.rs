//! Error types for verdb.

use std::io;
use thiserror::Error;

/// Result type alias for verdb operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types surfaced by the version-management core.
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// I/O error from manifest or CURRENT file operations.
    #[error("I/O error: {0}")]
    Io(String),

    /// Data corruption detected in a manifest record or recovered state.
    #[error("Corruption detected: {0}")]
    Corruption(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller supplied an argument the database cannot honor, e.g. a
    /// comparator whose name differs from the one the database was
    /// created with.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Internal error (should not happen).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl Error {
    /// Create a corruption error with the given message.
    pub fn corruption<S: Into<String>>(msg: S) -> Self {
        Error::Corruption(msg.into())
    }

    /// Create a not-found error.
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Error::NotFound(msg.into())
    }

    /// Create an invalid-argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        Error::InvalidArgument(msg.into())
    }

    /// Create an internal error.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Error::Internal(msg.into())
    }

    /// Check if this error indicates corruption.
    pub fn is_corruption(&self) -> bool {
        matches!(self, Error::Corruption(_))
    }

    /// Check if this error is an I/O failure.
    pub fn is_io(&self) -> bool {
        matches!(self, Error::Io(_))
    }
}

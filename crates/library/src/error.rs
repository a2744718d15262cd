//! Library Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::io::Error as IoError;
use std::path::PathBuf;

/// A library error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Underlying I/O error
    #[display("I/O error: {_0}")]
    Io(IoError),
    /// A configured base directory does not exist.
    #[display("base directory missing: {}", _0.display())]
    MissingBaseDir(#[error(not(source))] PathBuf),
    /// A title path exists but is a plain file.
    #[display("not a directory: {}", _0.display())]
    NotADirectory(#[error(not(source))] PathBuf),
    /// Symlinked titles are never auto-managed.
    #[display("symlinked title excluded: {}", _0.display())]
    SymlinkedTitle(#[error(not(source))] PathBuf),
    /// A title record exists but cannot be understood.
    #[display("malformed title record: {_0}")]
    Record(#[error(not(source))] String),
}
impl From<IoError> for ErrorKind {
    fn from(err: IoError) -> Self {
        Self::Io(err)
    }
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}

//! Inspection Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::io::Error as IoError;

/// An inspection error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for inspection operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
/// All of them are recoverable: a title whose archive cannot be inspected
/// simply stays unresolved.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The archive file could not be read at all.
    #[display("I/O error: {_0}")]
    Io(IoError),
    /// The file is not a readable zip container.
    #[display("unreadable archive container: {_0}")]
    Container(zip::result::ZipError),
    /// The container has no embedded metadata entry.
    #[display("archive has no `{_0}` entry")]
    MissingEntry(#[error(not(source))] &'static str),
    /// The metadata entry has no recognizable source line.
    #[display("no `Site:` line in archive metadata")]
    NoSiteLine,
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

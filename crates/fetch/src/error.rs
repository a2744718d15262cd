//! Fetch Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::io::Error as IoError;

/// A fetch error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for fetch operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// A tool-reported failure (non-zero exit) is *not* an error: the tool's own
/// exit status is recorded on the outcome instead. These variants cover only
/// faults in getting the tool to run at all.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// No fetch tool executable was found on `PATH`.
    #[display("fetch tool `{_0}` not found in PATH")]
    ToolNotFound(#[error(not(source))] String),
    /// The child process could not be started or awaited.
    #[display("failed to run fetch tool: {_0}")]
    Spawn(IoError),
    /// The language line could not be written to the tool's prompt.
    #[display("failed to answer the tool's language prompt: {_0}")]
    Prompt(IoError),
    /// The tool was killed by a signal instead of exiting.
    #[display("fetch tool terminated by a signal")]
    Signalled,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Spawn(_) | Self::Prompt(_) | Self::Signalled)
    }
}

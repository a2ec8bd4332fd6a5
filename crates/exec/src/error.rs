//! Exec Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// An exec error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for exec operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// None of the candidate executables were found in `PATH`.
    #[display("executable not found: {_0}")]
    NotFound(#[error(not(source))] String),
    /// The executable exists but the process could not be started.
    #[display("could not start {_0}")]
    Spawn(#[error(not(source))] String),
    /// The tool exited with a non-zero exit code.
    #[display("{tool} exited with code {code}")]
    Failed { tool: String, code: i32 },
    /// The tool was killed by a signal before it could exit.
    #[display("{_0} was terminated by a signal")]
    Terminated(#[error(not(source))] String),
    /// The tool ran longer than the configured timeout and was killed.
    #[display("{_0} timed out")]
    Timeout(#[error(not(source))] String),
    /// Waiting on the child process failed.
    #[display("I/O error")]
    Io,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Io)
    }
}

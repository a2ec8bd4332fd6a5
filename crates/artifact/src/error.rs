//! Artifact Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// An artifact error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for artifact operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A temporary file or directory could not be created in this location.
    #[display("could not create temporary artifact in {}", _0.display())]
    Create(#[error(not(source))] PathBuf),
    /// The artifact exists but could not be removed from disk.
    #[display("could not remove artifact {}", _0.display())]
    Release(#[error(not(source))] PathBuf),
    /// The artifact could not be moved to its final location.
    #[display("could not move artifact to {}", _0.display())]
    Persist(#[error(not(source))] PathBuf),
    /// The artifact was already released (usually by a purge) before this
    /// operation ran.
    #[display("artifact already released: {}", _0.display())]
    Released(#[error(not(source))] PathBuf),
    /// A directory listing was requested for something that isn't a directory.
    #[display("not a directory artifact: {}", _0.display())]
    NotDirectory(#[error(not(source))] PathBuf),
    /// Reading a directory artifact failed.
    #[display("I/O error")]
    Io,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io)
    }
}

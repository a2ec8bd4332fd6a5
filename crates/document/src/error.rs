//! Document Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A document error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for document operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The external tool could not be found or started.
    #[display("{_0} unavailable")]
    Unavailable(#[error(not(source))] &'static str),
    /// Assembly was requested with no pages.
    #[display("no pages to assemble")]
    NoPages,
    /// The merge tool ran and reported failure.
    #[display("page assembly failed")]
    Assembly,
    /// The compression tool ran and reported failure.
    #[display("document compression failed")]
    Compression,
    /// A zero target resolution was requested.
    #[display("invalid target resolution: {_0} dpi")]
    InvalidResolution(#[error(not(source))] u32),
    /// Reading or writing a document file failed.
    #[display("I/O error")]
    Io,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}

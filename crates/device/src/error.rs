//! Device Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A device error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for device operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The scan driver could not be found or started.
    #[display("scan driver unavailable")]
    Unavailable,
    /// The scan driver ran and reported failure.
    #[display("scan driver failed")]
    Failed,
    /// The scan driver reported success but wrote nothing.
    #[display("scan produced no data: {}", _0.display())]
    NoData(#[error(not(source))] PathBuf),
    /// The page artifact could not be opened or inspected.
    #[display("I/O error")]
    Io,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}

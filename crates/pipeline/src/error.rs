//! Pipeline Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. The variant names the stage that
//! failed; the error tree underneath says why.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A pipeline error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies which stage of a capture run failed.
///
/// ### Caller Errors
/// - [`ErrorKind::Usage`] - raised before the scanner is touched.
///
/// ### Stage Errors
/// - [`ErrorKind::Device`]
/// - [`ErrorKind::EmptyBatch`]
/// - [`ErrorKind::Assembly`]
/// - [`ErrorKind::Compression`]
///
/// ### Environment Errors
/// - [`ErrorKind::Artifact`]
/// - [`ErrorKind::Prompt`]
/// - [`ErrorKind::Interrupted`]
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The output path doesn't name a PDF file.
    #[display("output file must end in .pdf: {}", _0.display())]
    Usage(#[error(not(source))] PathBuf),
    /// The scanner driver failed or returned no image.
    #[display("scanning failed")]
    Device,
    /// The document feeder produced no pages.
    #[display("no pages were scanned")]
    EmptyBatch,
    /// Merging page images into a document failed.
    #[display("page assembly failed")]
    Assembly,
    /// Shrinking the merged document failed.
    #[display("compression failed")]
    Compression,
    /// Creating, listing or moving a temporary file failed.
    #[display("temporary file handling failed")]
    Artifact,
    /// Reading the operator's answer failed.
    #[display("could not read operator input")]
    Prompt,
    /// The run was cancelled by an interrupt.
    #[display("interrupted")]
    Interrupted,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}

//! Application Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use scandoc_pipeline::error::{Error as PipelineError, ErrorKind as PipelineErrorKind};
use std::process::ExitCode;

/// An application error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for application operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Configuration could not be loaded.
    #[display("could not load configuration")]
    Config,
    /// One of the external tools is missing.
    #[display("required external tool is not available")]
    Setup,
    /// The capture run itself failed; the inner kind names the stage.
    #[display("{_0}")]
    Capture(#[error(not(source))] PipelineErrorKind),
    /// The capture thread panicked.
    #[display("capture task failed unexpectedly")]
    Panicked,
}

impl ErrorKind {
    pub const INTERRUPTED_STATUS: u8 = 130;

    /// Convert a pipeline error into an application error, keeping the
    /// pipeline's error tree as a child.
    #[track_caller]
    pub fn capture(err: PipelineError) -> Error {
        let inner = (*err).clone();
        err.raise(ErrorKind::Capture(inner))
    }

    /// Process exit status: 2 for usage errors (matching clap), 130 for an
    /// interrupt, 1 for everything else.
    pub fn exit_status(&self) -> u8 {
        match self {
            Self::Capture(PipelineErrorKind::Usage(_)) => 2,
            Self::Capture(PipelineErrorKind::Interrupted) => Self::INTERRUPTED_STATUS,
            _ => 1,
        }
    }

    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.exit_status())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::path::PathBuf;

    #[test]
    fn capture_keeps_stage() {
        let err = ErrorKind::capture(exn::Exn::from(PipelineErrorKind::Compression));
        assert!(matches!(&*err, ErrorKind::Capture(PipelineErrorKind::Compression)));
        assert_eq!((*err).to_string(), "compression failed");
    }

    #[rstest]
    #[case(ErrorKind::Capture(PipelineErrorKind::Usage(PathBuf::from("x.jpg"))), 2)]
    #[case(ErrorKind::Capture(PipelineErrorKind::Interrupted), 130)]
    #[case(ErrorKind::Capture(PipelineErrorKind::Device), 1)]
    #[case(ErrorKind::Capture(PipelineErrorKind::EmptyBatch), 1)]
    #[case(ErrorKind::Setup, 1)]
    #[case(ErrorKind::Config, 1)]
    fn exit_status(#[case] kind: ErrorKind, #[case] expected: u8) {
        assert_eq!(kind.exit_status(), expected);
    }
}

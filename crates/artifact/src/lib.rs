//! Scoped temporary artifacts.
//!
//! Every intermediate file a capture run produces (scanned pages, the merged
//! document, the scratch copy of the final output) and the feeder's batch
//! directory is handed out by an [`ArtifactStore`] as an [`Artifact`] guard.
//!
//! Cleanup is registered at the moment of acquisition, not when the caller
//! gets around to it:
//!
//! - dropping an [`Artifact`] removes it from disk, so `?` and panics inside a
//!   capture loop still clean up everything acquired so far;
//! - the store keeps a ledger of pending artifacts which [`ArtifactStore::purge`]
//!   unwinds in reverse acquisition order, for exit paths that never reach the
//!   guard's destructor (an interrupt signal, for instance);
//! - an artifact is released exactly once no matter how many of these paths
//!   race for it, which [`ArtifactStore::stats`] lets tests verify.

mod artifact;
pub mod error;
mod store;

pub use crate::artifact::Artifact;
pub use crate::store::{ArtifactStore, Stats};

/// What an artifact holds. Determines its on-disk name and whether it is a
/// file or a directory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// A single scanned page image.
    Page,
    /// The merged, not yet compressed, document.
    Document,
    /// Scratch file that becomes the final output on success.
    Output,
    /// Directory the document feeder writes its numbered pages into.
    Batch,
}

impl ArtifactKind {
    pub(crate) fn prefix(&self) -> &'static str {
        match self {
            Self::Page => ".scandoc-page-",
            Self::Document => ".scandoc-document-",
            Self::Output => ".scandoc-output-",
            Self::Batch => ".scandoc-batch-",
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, Self::Batch)
    }
}

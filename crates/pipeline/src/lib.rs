//! The capture pipeline.
//!
//! Strings the scanner, the merge tool and the compressor together for one of
//! three [`Mode`]s:
//!
//! - **one page**: scan, assemble, compress;
//! - **many pages**: scan, ask the operator, repeat until they say stop, then
//!   assemble and compress everything in capture order;
//! - **many pages, fed**: let the document feeder scan the whole stack in one
//!   driver call, then assemble and compress in file name order.
//!
//! Every intermediate file comes from an [`ArtifactStore`](scandoc_artifact::ArtifactStore)
//! and is gone by the time a run returns, whether it succeeded or not. The
//! output file only appears, complete, at the very end of a successful run.

mod batch;
pub mod error;
mod pipeline;
mod prompt;

pub use crate::batch::{CaptureBatch, Page};
pub use crate::pipeline::{CapturePipeline, DEFAULT_TARGET_DPI, LoopState, Report, validate_outfile};
pub use crate::prompt::{Prompt, ScriptedPrompt, TerminalPrompt};
use derive_more::Display;

/// How pages are collected.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
pub enum Mode {
    #[display("single page")]
    OnePage,
    #[display("manual multi-page")]
    ManyPages,
    #[display("document feeder")]
    ManyPagesFed,
}

impl Mode {
    /// The feeder wins when both flags are given.
    pub fn from_flags(multipage: bool, adf: bool) -> Self {
        match (multipage, adf) {
            (_, true) => Self::ManyPagesFed,
            (true, false) => Self::ManyPages,
            (false, false) => Self::OnePage,
        }
    }
}

//! Document assembly and compression.
//!
//! Two steps turn a stack of page images into the file the user asked for:
//!
//! 1. a [`DocumentAssembler`] merges the pages, in the order given, into one
//!    PDF ([`ImageMagick`]);
//! 2. a [`DocumentCompressor`] rewrites that PDF with every embedded image
//!    downsampled to a target resolution ([`Ghostscript`]).
//!
//! Mock implementations for tests are available behind the `mock` feature.

pub mod error;
mod ghostscript;
mod magick;
#[cfg(feature = "mock")]
mod mock;

use crate::error::Result;
pub use crate::ghostscript::Ghostscript;
pub use crate::magick::ImageMagick;
#[cfg(feature = "mock")]
pub use crate::mock::{MockAssembler, MockCompressor};
use std::path::{Path, PathBuf};

/// Merges page images into a single document.
pub trait DocumentAssembler {
    /// Write a document to `output` with one page per entry of `pages`, in
    /// exactly that order.
    ///
    /// `pages` must not be empty.
    fn assemble(&self, pages: &[PathBuf], output: &Path) -> Result<()>;
}

/// Shrinks a document by downsampling its embedded images.
pub trait DocumentCompressor {
    /// Rewrite `input` into `output` with color, gray and monochrome images
    /// all downsampled to `target_dpi`. Running it again on its own output
    /// must succeed.
    fn compress(&self, input: &Path, output: &Path, target_dpi: u32) -> Result<()>;
}

impl<A: DocumentAssembler + ?Sized> DocumentAssembler for &A {
    fn assemble(&self, pages: &[PathBuf], output: &Path) -> Result<()> {
        (**self).assemble(pages, output)
    }
}

impl<C: DocumentCompressor + ?Sized> DocumentCompressor for &C {
    fn compress(&self, input: &Path, output: &Path, target_dpi: u32) -> Result<()> {
        (**self).compress(input, output, target_dpi)
    }
}

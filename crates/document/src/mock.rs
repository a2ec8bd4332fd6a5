//! Document tools for testing.

use crate::error::{ErrorKind, Result};
use crate::{DocumentAssembler, DocumentCompressor};
use exn::ResultExt;
use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};

/// Assembler that joins page contents with newlines, so the page order of the
/// "document" is plain to see.
#[derive(Default)]
pub struct MockAssembler {
    fail: bool,
    calls: Cell<usize>,
    last: RefCell<Vec<String>>,
}

impl MockAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail like the merge tool would, after writing a partial output.
    pub fn failing() -> Self {
        Self { fail: true, ..Self::default() }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    /// Page contents from the most recent call, in the order received.
    pub fn last_pages(&self) -> Vec<String> {
        self.last.borrow().clone()
    }
}

impl DocumentAssembler for MockAssembler {
    fn assemble(&self, pages: &[PathBuf], output: &Path) -> Result<()> {
        self.calls.set(self.calls.get() + 1);
        if pages.is_empty() {
            exn::bail!(ErrorKind::NoPages);
        }
        let contents = pages
            .iter()
            .map(|page| std::fs::read_to_string(page).or_raise(|| ErrorKind::Io))
            .collect::<Result<Vec<_>>>()?;
        *self.last.borrow_mut() = contents.clone();
        if self.fail {
            std::fs::write(output, "%PDF-partial").or_raise(|| ErrorKind::Io)?;
            exn::bail!(ErrorKind::Assembly);
        }
        std::fs::write(output, contents.join("\n")).or_raise(|| ErrorKind::Io)
    }
}

/// Compressor that copies its input, optionally failing halfway through.
#[derive(Default)]
pub struct MockCompressor {
    fail: bool,
    calls: RefCell<Vec<(PathBuf, u32)>>,
}

impl MockCompressor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail like the rewrite tool would, after writing a truncated output.
    pub fn failing() -> Self {
        Self { fail: true, ..Self::default() }
    }

    /// Output path and target resolution of every call.
    pub fn calls(&self) -> Vec<(PathBuf, u32)> {
        self.calls.borrow().clone()
    }
}

impl DocumentCompressor for MockCompressor {
    fn compress(&self, input: &Path, output: &Path, target_dpi: u32) -> Result<()> {
        self.calls.borrow_mut().push((output.to_path_buf(), target_dpi));
        if target_dpi == 0 {
            exn::bail!(ErrorKind::InvalidResolution(target_dpi));
        }
        let data = std::fs::read(input).or_raise(|| ErrorKind::Io)?;
        if self.fail {
            std::fs::write(output, &data[..data.len() / 2]).or_raise(|| ErrorKind::Io)?;
            exn::bail!(ErrorKind::Compression);
        }
        std::fs::write(output, data).or_raise(|| ErrorKind::Io)
    }
}

//! Scripted capture device for testing.

use crate::CaptureDevice;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use scandoc_config::ScanParameters;
use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};

/// Capture device that never touches hardware.
///
/// Single-page captures write `page <n>` (1-based, counting every attempt) to
/// the page file, so tests can check the order pages end up in. Feeder
/// batches write whatever files the test set up with
/// [`with_batch()`](Self::with_batch).
///
/// # Example
///
/// ```
/// use scandoc_config::ScanParameters;
/// use scandoc_device::{CaptureDevice, MockDevice};
///
/// let dir = tempfile::tempdir().unwrap();
/// let page = dir.path().join("page.tiff");
/// let device = MockDevice::new().fail_on(2);
/// device.capture_one(&ScanParameters::default(), &page).unwrap();
/// assert_eq!(std::fs::read_to_string(&page).unwrap(), "page 1");
/// assert!(device.capture_one(&ScanParameters::default(), &page).is_err());
/// ```
#[derive(Default)]
pub struct MockDevice {
    fail_on: Option<usize>,
    batch: Vec<(String, Vec<u8>)>,
    fail_batch: bool,
    captures: Cell<usize>,
    batches: Cell<usize>,
    pages: RefCell<Vec<PathBuf>>,
}

impl MockDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the `n`th single-page capture (1-based) fail like a driver error.
    pub fn fail_on(mut self, n: usize) -> Self {
        self.fail_on = Some(n);
        self
    }

    /// Files a feeder batch will produce, written in the order given.
    pub fn with_batch(mut self, files: impl IntoIterator<Item = (impl Into<String>, impl Into<Vec<u8>>)>) -> Self {
        self.batch = files.into_iter().map(|(name, data)| (name.into(), data.into())).collect();
        self
    }

    /// Make feeder batches fail like a driver error, after writing any
    /// configured files (a jam halfway through the stack).
    pub fn fail_batch(mut self) -> Self {
        self.fail_batch = true;
        self
    }

    /// Number of single-page captures attempted, including failed ones.
    pub fn captures(&self) -> usize {
        self.captures.get()
    }

    /// Number of feeder batches attempted.
    pub fn batches(&self) -> usize {
        self.batches.get()
    }

    /// Every page path handed to [`capture_one()`](CaptureDevice::capture_one),
    /// in call order.
    pub fn page_paths(&self) -> Vec<PathBuf> {
        self.pages.borrow().clone()
    }
}

impl CaptureDevice for MockDevice {
    fn capture_one(&self, _params: &ScanParameters, page: &Path) -> Result<()> {
        let n = self.captures.get() + 1;
        self.captures.set(n);
        self.pages.borrow_mut().push(page.to_path_buf());
        if self.fail_on == Some(n) {
            exn::bail!(ErrorKind::Failed);
        }
        std::fs::write(page, format!("page {n}")).or_raise(|| ErrorKind::Io)
    }

    fn capture_batch(&self, _params: &ScanParameters, target_dir: &Path) -> Result<()> {
        self.batches.set(self.batches.get() + 1);
        for (name, data) in &self.batch {
            std::fs::write(target_dir.join(name), data).or_raise(|| ErrorKind::Io)?;
        }
        if self.fail_batch {
            exn::bail!(ErrorKind::Failed);
        }
        Ok(())
    }
}

//! Scanner access.
//!
//! A [`CaptureDevice`] turns [`ScanParameters`] into raster images on disk.
//! [`Scanimage`] is the real thing (SANE's `scanimage` front-end); with the
//! `mock` feature, [`MockDevice`] stands in for it in tests.

pub mod error;
#[cfg(feature = "mock")]
mod mock;
mod scanimage;

use crate::error::Result;
#[cfg(feature = "mock")]
pub use crate::mock::MockDevice;
pub use crate::scanimage::Scanimage;
use scandoc_config::ScanParameters;
use std::path::Path;

/// File name pattern, without extension, for pages produced by a feeder batch.
/// Zero-padded so that sorting file names sorts pages.
pub const BATCH_PATTERN: &str = "page-%04d";

/// A source of scanned page images.
///
/// Neither method retries; a failure aborts the capture run.
pub trait CaptureDevice {
    /// Scan exactly one page, writing the raster image to `page`.
    ///
    /// Fails if the driver fails or produces an empty image.
    fn capture_one(&self, params: &ScanParameters, page: &Path) -> Result<()>;

    /// Scan everything in the automatic document feeder into `target_dir`,
    /// one file per page named after [`BATCH_PATTERN`].
    ///
    /// The driver loops over the feeder itself; this is one invocation.
    /// Enumerating what was produced is left to the caller.
    fn capture_batch(&self, params: &ScanParameters, target_dir: &Path) -> Result<()>;
}

impl<D: CaptureDevice + ?Sized> CaptureDevice for &D {
    fn capture_one(&self, params: &ScanParameters, page: &Path) -> Result<()> {
        (**self).capture_one(params, page)
    }

    fn capture_batch(&self, params: &ScanParameters, target_dir: &Path) -> Result<()> {
        (**self).capture_batch(params, target_dir)
    }
}

use crate::DocumentAssembler;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use scandoc_exec::Tool;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::instrument;

/// ImageMagick, invoked as `magick <pages>... <output>`.
///
/// ImageMagick 6 installs only `convert`, which takes the same arguments.
pub struct ImageMagick {
    tool: Tool,
}

impl ImageMagick {
    const CANDIDATES: &'static [&'static str] = &["magick", "convert"];

    pub fn new(tool: Tool) -> Self {
        Self { tool }
    }

    /// Use the configured executable, or find `magick`/`convert` on `PATH`.
    pub fn discover(configured: Option<&Path>, timeout: Option<Duration>) -> Result<Self> {
        let tool = Tool::resolve(configured, Self::CANDIDATES).or_raise(|| ErrorKind::Unavailable("ImageMagick"))?;
        Ok(Self::new(tool.with_timeout(timeout)))
    }
}

impl DocumentAssembler for ImageMagick {
    #[instrument(skip_all, fields(output = %output.display()))]
    fn assemble(&self, pages: &[PathBuf], output: &Path) -> Result<()> {
        if pages.is_empty() {
            exn::bail!(ErrorKind::NoPages);
        }
        tracing::info!(pages = pages.len(), "Assembling pages into document");
        self.tool
            .run(self.tool.command().args(pages).arg(output))
            .or_raise(|| ErrorKind::Assembly)
    }
}

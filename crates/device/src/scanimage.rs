use crate::error::{ErrorKind, Result};
use crate::{BATCH_PATTERN, CaptureDevice};
use exn::ResultExt;
use scandoc_config::ScanParameters;
use scandoc_exec::Tool;
use std::ffi::OsString;
use std::fs::File;
use std::path::Path;
use std::time::Duration;
use tracing::instrument;

/// SANE's `scanimage` command-line front-end.
pub struct Scanimage {
    tool: Tool,
}

impl Scanimage {
    const CANDIDATES: &'static [&'static str] = &["scanimage"];

    pub fn new(tool: Tool) -> Self {
        Self { tool }
    }

    /// Use the configured executable, or find `scanimage` on `PATH`.
    pub fn discover(configured: Option<&Path>, timeout: Option<Duration>) -> Result<Self> {
        let tool = Tool::resolve(configured, Self::CANDIDATES).or_raise(|| ErrorKind::Unavailable)?;
        Ok(Self::new(tool.with_timeout(timeout)))
    }

    fn common_args(params: &ScanParameters) -> Vec<OsString> {
        vec![
            OsString::from(format!("--format={}", params.format)),
            "--mode".into(),
            params.mode.to_string().into(),
            "--resolution".into(),
            params.resolution.to_string().into(),
        ]
    }

    fn batch_args(params: &ScanParameters, target_dir: &Path) -> Vec<OsString> {
        let mut args = Self::common_args(params);
        args.extend([
            OsString::from("--source"),
            params.source.clone().into(),
            "-x".into(),
            params.area.width.to_string().into(),
            "-y".into(),
            params.area.height.to_string().into(),
        ]);
        let mut batch = OsString::from("--batch=");
        batch.push(target_dir.join(format!("{BATCH_PATTERN}{}", params.format.extension())));
        args.push(batch);
        args
    }
}

impl CaptureDevice for Scanimage {
    #[instrument(skip_all, fields(page = %page.display()))]
    fn capture_one(&self, params: &ScanParameters, page: &Path) -> Result<()> {
        let output = File::create(page).or_raise(|| ErrorKind::Io)?;
        tracing::info!(mode = %params.mode, resolution = params.resolution, "Scanning page");
        self.tool
            .run(self.tool.command().args(Self::common_args(params)).stdout(output))
            .or_raise(|| ErrorKind::Failed)?;
        let written = std::fs::metadata(page).or_raise(|| ErrorKind::Io)?.len();
        if written == 0 {
            exn::bail!(ErrorKind::NoData(page.to_path_buf()));
        }
        tracing::debug!(bytes = written, "Page captured");
        Ok(())
    }

    #[instrument(skip_all, fields(target = %target_dir.display()))]
    fn capture_batch(&self, params: &ScanParameters, target_dir: &Path) -> Result<()> {
        tracing::info!(
            mode = %params.mode,
            resolution = params.resolution,
            source = %params.source,
            "Scanning from document feeder"
        );
        self.tool
            .run(self.tool.command().args(Self::batch_args(params, target_dir)))
            .or_raise(|| ErrorKind::Failed)
    }
}

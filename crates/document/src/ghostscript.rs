use crate::DocumentCompressor;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use scandoc_exec::Tool;
use std::ffi::OsString;
use std::path::Path;
use std::time::Duration;
use tracing::instrument;

/// Ghostscript's `pdfwrite` device with a fixed screen-quality profile.
pub struct Ghostscript {
    tool: Tool,
}

impl Ghostscript {
    const CANDIDATES: &'static [&'static str] = &["gs", "gswin64c", "gswin32c"];

    /// Settings that never change between runs. Fonts are embedded and
    /// subsetted so the output renders anywhere.
    const PROFILE: &'static [&'static str] = &[
        "-q",
        "-dNOPAUSE",
        "-dBATCH",
        "-dSAFER",
        "-sDEVICE=pdfwrite",
        "-dCompatibilityLevel=1.4",
        "-dPDFSETTINGS=/screen",
        "-dEmbedAllFonts=true",
        "-dSubsetFonts=true",
        "-dColorImageDownsampleType=/Bicubic",
        "-dGrayImageDownsampleType=/Bicubic",
        "-dMonoImageDownsampleType=/Bicubic",
    ];

    pub fn new(tool: Tool) -> Self {
        Self { tool }
    }

    /// Use the configured executable, or find `gs` on `PATH`.
    pub fn discover(configured: Option<&Path>, timeout: Option<Duration>) -> Result<Self> {
        let tool = Tool::resolve(configured, Self::CANDIDATES).or_raise(|| ErrorKind::Unavailable("Ghostscript"))?;
        Ok(Self::new(tool.with_timeout(timeout)))
    }

    fn args(input: &Path, output: &Path, target_dpi: u32) -> Vec<OsString> {
        let mut args: Vec<OsString> = Self::PROFILE.iter().map(OsString::from).collect();
        for class in ["Color", "Gray", "Mono"] {
            args.push(format!("-d{class}ImageResolution={target_dpi}").into());
        }
        let mut output_file = OsString::from("-sOutputFile=");
        output_file.push(escape_output(output));
        args.push(output_file);
        args.push(input.into());
        args
    }
}

/// Ghostscript reads `%` in an output file name as a page number template.
fn escape_output(output: &Path) -> OsString {
    match output.to_str() {
        Some(path) => path.replace('%', "%%").into(),
        // Can't rewrite a non-UTF-8 path without unsafe; pass it as is.
        None => output.into(),
    }
}

impl DocumentCompressor for Ghostscript {
    #[instrument(skip_all, fields(input = %input.display(), output = %output.display()))]
    fn compress(&self, input: &Path, output: &Path, target_dpi: u32) -> Result<()> {
        if target_dpi == 0 {
            exn::bail!(ErrorKind::InvalidResolution(target_dpi));
        }
        tracing::info!(target_dpi, "Compressing document");
        self.tool
            .run(self.tool.command().args(Self::args(input, output, target_dpi)))
            .or_raise(|| ErrorKind::Compression)?;
        if tracing::enabled!(tracing::Level::DEBUG)
            && let (Ok(before), Ok(after)) = (std::fs::metadata(input), std::fs::metadata(output))
        {
            tracing::debug!(before = before.len(), after = after.len(), "Document compressed");
        }
        Ok(())
    }
}

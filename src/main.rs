mod cli;
mod error;

use crate::cli::Cli;
use crate::error::{ErrorKind, Result};
use clap::Parser;
use exn::ResultExt;
use scandoc_artifact::ArtifactStore;
use scandoc_config::Config;
use scandoc_device::Scanimage;
use scandoc_document::{Ghostscript, ImageMagick};
use scandoc_pipeline::{CapturePipeline, Report, TerminalPrompt};
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level())))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match run(cli).await {
        Ok(report) => {
            println!("{}", report.output.display());
            ExitCode::SUCCESS
        },
        Err(err) => {
            let kind: &ErrorKind = &err;
            tracing::error!("{kind}");
            tracing::debug!("{err:?}");
            kind.exit_code()
        },
    }
}

async fn run(cli: Cli) -> Result<Report> {
    let config = Config::load(cli.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    let mode = cli.mode();
    let outfile = cli.outfile;

    // Find every tool up front; a missing Ghostscript should not cost a scan.
    let timeout = config.tools.timeout();
    let device = Scanimage::discover(config.tools.scanimage.as_deref(), timeout).or_raise(|| ErrorKind::Setup)?;
    let assembler = ImageMagick::discover(config.tools.magick.as_deref(), timeout).or_raise(|| ErrorKind::Setup)?;
    let compressor =
        Ghostscript::discover(config.tools.ghostscript.as_deref(), timeout).or_raise(|| ErrorKind::Setup)?;

    let store = ArtifactStore::new();
    let interrupted = Arc::new(AtomicBool::new(false));
    let pipeline = CapturePipeline::new(store.clone(), device, assembler, compressor, config.scan)
        .with_target_dpi(config.output.target_dpi)
        .with_interrupt(interrupted.clone());

    tracing::info!(%mode, output = %outfile.display(), "Starting capture");
    let capture = tokio::task::spawn_blocking(move || pipeline.run(mode, &outfile, &mut TerminalPrompt));
    tokio::select! {
        biased;
        Ok(()) = tokio::signal::ctrl_c() => {
            interrupted.store(true, Ordering::SeqCst);
            let purged = store.purge();
            tracing::warn!(purged, "Interrupted; temporary files removed");
            // The capture thread may be blocked reading stdin and will never
            // notice the flag, so don't wait for it.
            std::process::exit(i32::from(ErrorKind::INTERRUPTED_STATUS));
        },
        joined = capture => joined.or_raise(|| ErrorKind::Panicked)?.map_err(ErrorKind::capture),
    }
}

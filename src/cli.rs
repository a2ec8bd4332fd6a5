use clap::{ArgAction, Parser};
use scandoc_pipeline::{Mode, validate_outfile};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "scandoc", about = "Scan pages into a single compressed PDF", version)]
pub struct Cli {
    /// Where to write the PDF (must end in .pdf)
    #[arg(value_parser = parse_outfile)]
    pub outfile: PathBuf,
    /// Scan several pages, asking after each one whether to continue
    #[arg(short, long)]
    pub multipage: bool,
    /// Scan every page in the automatic document feeder (overrides --multipage)
    #[arg(long)]
    pub adf: bool,
    /// Read configuration from FILE instead of the default location
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Log more (repeat for even more)
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,
    /// Only log warnings and errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    pub fn mode(&self) -> Mode {
        Mode::from_flags(self.multipage, self.adf)
    }

    /// Log filter used when `RUST_LOG` isn't set.
    pub fn log_level(&self) -> &'static str {
        match (self.quiet, self.verbose) {
            (true, _) => "warn",
            (false, 0) => "info",
            (false, 1) => "debug",
            (false, _) => "trace",
        }
    }
}

fn parse_outfile(value: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(value);
    validate_outfile(&path).map_err(|err| (*err).to_string())?;
    Ok(path)
}

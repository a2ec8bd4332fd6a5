//! Configuration for scandoc.
//!
//! Values are layered with [`figment`], lowest priority first:
//!
//! 1. compiled defaults,
//! 2. a TOML file: either the one passed explicitly or `config.toml` in the
//!    platform config directory (e.g. `~/.config/scandoc/config.toml`),
//! 3. environment variables prefixed `SCANDOC_`, with `__` separating nested
//!    keys (`SCANDOC_SCAN__MODE=Color`, `SCANDOC_OUTPUT__TARGET_DPI=100`).
//!
//! Configuration is only ever read; nothing is written back.

pub mod error;
mod scan;

pub use crate::scan::{ColorMode, RasterFormat, ScanArea, ScanParameters};
use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const ENV_PREFIX: &str = "SCANDOC_";

/// Settings for the final compressed document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Resolution embedded images are downsampled to.
    pub target_dpi: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { target_dpi: 150 }
    }
}

/// Overrides for the external tools. Anything left unset is discovered on
/// `PATH`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub scanimage: Option<PathBuf>,
    pub magick: Option<PathBuf>,
    pub ghostscript: Option<PathBuf>,
    /// Kill any external tool that runs longer than this. Unset means wait
    /// forever, which is what you want for a flatbed and a slow operator.
    pub timeout_secs: Option<u64>,
}

impl ToolsConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scan: ScanParameters,
    pub output: OutputConfig,
    pub tools: ToolsConfig,
}

impl Config {
    /// Load configuration from every source. `explicit` replaces the default
    /// config file location and must exist.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        Self::from_figment(Self::figment(explicit)?)
    }

    /// Assemble the provider stack without extracting it.
    pub fn figment(explicit: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        match explicit {
            Some(path) => {
                if !path.is_file() {
                    exn::bail!(ErrorKind::NotFound(path.to_path_buf()));
                }
                tracing::debug!(path = %path.display(), "Loading explicit config file");
                figment = figment.merge(Toml::file_exact(path));
            },
            None => {
                if let Some(path) = default_path() {
                    tracing::trace!(path = %path.display(), "Checking default config file location");
                    figment = figment.merge(Toml::file_exact(path));
                }
            },
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Config = figment.extract().or_raise(|| ErrorKind::Parse)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.scan.resolution == 0 {
            exn::bail!(ErrorKind::Invalid("scan.resolution must be greater than zero".to_string()));
        }
        if self.output.target_dpi == 0 {
            exn::bail!(ErrorKind::Invalid("output.target_dpi must be greater than zero".to_string()));
        }
        let area = self.scan.area;
        if !(area.width.is_finite() && area.width > 0.0 && area.height.is_finite() && area.height > 0.0) {
            exn::bail!(ErrorKind::Invalid(format!(
                "scan.area must be positive, got {}x{}",
                area.width, area.height
            )));
        }
        if self.scan.source.trim().is_empty() {
            exn::bail!(ErrorKind::Invalid("scan.source must not be empty".to_string()));
        }
        Ok(())
    }
}

/// `config.toml` inside the platform's config directory for scandoc.
pub fn default_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "scandoc").map(|dirs| dirs.config_dir().join("config.toml"))
}

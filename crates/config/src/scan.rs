use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Color mode requested from the scanner. Displays as the value SANE expects
/// for `--mode`.
#[derive(Clone, Copy, Debug, Default, Display, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorMode {
    #[serde(alias = "lineart")]
    Lineart,
    #[default]
    #[serde(alias = "gray", alias = "grey", alias = "Grey")]
    Gray,
    #[serde(alias = "color", alias = "colour", alias = "Colour")]
    Color,
}

/// Raster format the driver writes.
#[derive(Clone, Copy, Debug, Default, Display, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RasterFormat {
    #[display("pnm")]
    Pnm,
    #[default]
    #[display("tiff")]
    Tiff,
    #[display("png")]
    Png,
    #[display("jpeg")]
    Jpeg,
}

impl RasterFormat {
    /// File extension including the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pnm => ".pnm",
            Self::Tiff => ".tiff",
            Self::Png => ".png",
            Self::Jpeg => ".jpg",
        }
    }
}

/// Physical scan area in millimetres, measured from the top-left corner.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScanArea {
    pub width: f64,
    pub height: f64,
}

impl Default for ScanArea {
    /// A4 portrait.
    fn default() -> Self {
        Self { width: 210.0, height: 297.0 }
    }
}

/// Everything the scanner is told for one run. Built once at startup and
/// never mutated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanParameters {
    pub mode: ColorMode,
    /// Dots per inch; must be a value the device supports.
    pub resolution: u32,
    pub format: RasterFormat,
    /// SANE source name for the automatic document feeder.
    pub source: String,
    /// Only applied to feeder batches.
    pub area: ScanArea,
}

impl Default for ScanParameters {
    fn default() -> Self {
        Self {
            mode: ColorMode::default(),
            resolution: 300,
            format: RasterFormat::default(),
            source: "ADF".to_string(),
            area: ScanArea::default(),
        }
    }
}

use crate::options::ConversionOptions;
use crate::rewrite::UrlOverride;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where and how temporary files are created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TempSettings {
    /// Directory for temporary files. Defaults to the system temp directory.
    pub dir: Option<PathBuf>,
    pub prefix: String,
    pub suffix: String,
}
impl Default for TempSettings {
    fn default() -> Self {
        Self { dir: None, prefix: "electron_pdf".to_string(), suffix: ".html".to_string() }
    }
}
impl TempSettings {
    pub fn dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

/// Everything the [`Renderer`](crate::Renderer) reads at call time.
///
/// Constructed once at startup and never mutated afterwards.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Keep rendered HTML files on disk after use, for inspection.
    pub debug: bool,
    /// Default options forwarded to `electron-pdf`; per-call options win.
    pub options: ConversionOptions,
    /// User-uploaded files.
    pub media: UrlOverride,
    /// Static assets (stylesheets, images, fonts).
    #[serde(rename = "static")]
    pub statics: UrlOverride,
    pub temp: TempSettings,
}

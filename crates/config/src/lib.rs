//! Layered configuration for epdf.
//!
//! Sources, lowest precedence first:
//!
//! 1. Built-in defaults ([`Config::default`])
//! 2. The user configuration file, `config.toml` in the platform config
//!    directory (e.g. `~/.config/epdf/config.toml`), if it exists
//! 3. An explicitly requested file (`.toml`, `.yaml`/`.yml` or `.json`)
//! 4. `EPDF_`-prefixed environment variables, nested with `__`
//!    (`EPDF_MEDIA__ROOT=/srv/app/media`)
//!
//! Environment variable names are lowercased, so camelCase tool options such
//! as `pageSize` must be set in a file rather than through the environment.
//!
//! ```toml
//! debug = false
//! executable = "electron-pdf"
//! templates = "/srv/app/templates"
//!
//! [options]
//! pageSize = "A4"
//! printBackground = true
//!
//! [media]
//! root = "/srv/app/media"
//! url = "/media/"
//!
//! [static]
//! root = "/srv/app/static"
//! url = "/static/"
//!
//! [temp]
//! prefix = "electron_pdf"
//! suffix = ".html"
//! ```

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use epdf_render::{EXECUTABLE, Settings};
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::instrument;

pub const ENV_PREFIX: &str = "EPDF_";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Name on `PATH`, or path to, the `electron-pdf` executable.
    pub executable: String,
    /// Directory of user templates, loaded on top of the builtins.
    pub templates: Option<PathBuf>,
    #[serde(flatten)]
    pub render: Settings,
}
impl Default for Config {
    fn default() -> Self {
        Self { executable: EXECUTABLE.to_string(), templates: None, render: Settings::default() }
    }
}
impl Config {
    /// Loads configuration from every source, including the user
    /// configuration file when present.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        Self::load_from(user_config_path().as_deref(), explicit)
    }

    /// Like [`load`](Self::load) but with the user configuration file given
    /// explicitly (or skipped with `None`).
    pub fn load_from(user: Option<&Path>, explicit: Option<&Path>) -> Result<Self> {
        Self::from_figment(Self::files(user, explicit)?.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Defaults merged with the configuration files, without the environment.
    #[instrument(skip_all)]
    pub fn files(user: Option<&Path>, explicit: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(user) = user.filter(|p| p.is_file()) {
            tracing::debug!(path = %user.display(), "Loading user configuration");
            figment = merge_file(figment, user)?;
        }
        if let Some(explicit) = explicit {
            if !explicit.is_file() {
                exn::bail!(ErrorKind::NotFound(explicit.to_path_buf()));
            }
            tracing::debug!(path = %explicit.display(), "Loading configuration file");
            figment = merge_file(figment, explicit)?;
        }
        Ok(figment)
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Config = figment.extract().map_err(|e| ErrorKind::Invalid(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.executable.trim().is_empty() {
            exn::bail!(ErrorKind::Invalid("executable must not be empty".to_string()));
        }
        let temp = &self.render.temp;
        if temp.prefix.contains(['/', '\\']) || temp.suffix.contains(['/', '\\']) {
            exn::bail!(ErrorKind::Invalid("temp.prefix and temp.suffix must not contain path separators".to_string()));
        }
        for (name, item) in [("media", &self.render.media), ("static", &self.render.statics)] {
            if item.is_active() && !item.root.is_absolute() {
                exn::bail!(ErrorKind::Invalid(format!("{name}.root must be an absolute path when {name}.url is set")));
            }
        }
        Ok(())
    }
}

/// `config.toml` in the platform-specific configuration directory.
pub fn user_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "epdf").map(|dirs| dirs.config_dir().join("config.toml"))
}

fn merge_file(figment: Figment, path: &Path) -> Result<Figment> {
    let extension = path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase);
    Ok(match extension.as_deref() {
        Some("toml") => figment.merge(Toml::file_exact(path)),
        Some("yaml" | "yml") => figment.merge(Yaml::file_exact(path)),
        Some("json") => figment.merge(Json::file_exact(path)),
        _ => exn::bail!(ErrorKind::UnsupportedFormat(path.to_path_buf())),
    })
}

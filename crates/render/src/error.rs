//! Render Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A render error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for render operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// A template failed to compile or render.
    #[display("template could not be compiled or rendered")]
    Template,
    /// No template is registered under the requested name.
    #[display("template not found: {_0}")]
    TemplateNotFound(#[error(not(source))] String),
    /// A URL override points at a root that cannot be turned into a `file://` URL.
    #[display("URL override root must be an absolute directory: {}", _0.display())]
    InvalidOverride(#[error(not(source))] PathBuf),
    #[display("electron-pdf executable not found: {_0}")]
    ExecutableNotFound(#[error(not(source))] String),
    /// The external tool exited unsuccessfully. `code` is `None` when the
    /// process was terminated by a signal.
    #[display("conversion failed (exit code: {}): {stderr}", code.map_or_else(|| "none".to_string(), |c| c.to_string()))]
    ConversionFailed { code: Option<i32>, stderr: String },
    /// The tool reported success but never wrote the output file.
    #[display("conversion output not found: {}", _0.display())]
    OutputMissing(#[error(not(source))] PathBuf),
    #[display("conversion output is empty: {}", _0.display())]
    EmptyOutput(#[error(not(source))] PathBuf),
    #[display("I/O error")]
    Io,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io)
    }
}

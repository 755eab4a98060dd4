//! CLI Error Types

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A CLI error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies the origin of a CLI failure.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Configuration could not be loaded.
    Config,
    /// Template loading, rendering or conversion failed.
    Render,
    /// The context file is unreadable or not a JSON object.
    #[display("invalid template context: {}", _0.display())]
    Context(#[error(not(source))] PathBuf),
    /// Writing the result to stdout failed.
    Output,
}

//! On-disk HTML handed to `electron-pdf`.

use crate::error::{ErrorKind, Result};
use crate::settings::TempSettings;
use exn::ResultExt;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::instrument;

pub type TempFile = tempfile::NamedTempFile;

/// A rendered HTML file on disk.
///
/// The file is removed when this value is dropped (or [closed](Self::close))
/// unless it was created with `retain` set, in which case it stays behind for
/// inspection and only the handle is closed.
#[derive(Debug)]
pub enum RenderedFile {
    Temporary(TempFile),
    Retained { file: File, path: PathBuf },
}
impl RenderedFile {
    /// Writes `content` as UTF-8 to a new, uniquely named file using the
    /// prefix, suffix and directory from `temp`.
    pub fn create(content: &str, temp: &TempSettings, retain: bool) -> Result<Self> {
        Self::create_from(content.as_bytes(), temp, retain)
    }

    /// Like [`create`](Self::create), but copies the content from `source`.
    ///
    /// If reading or writing fails the file is closed and removed before the
    /// error is returned, whether or not `retain` was requested.
    #[instrument(skip(source, temp))]
    pub fn create_from<R: Read>(mut source: R, temp: &TempSettings, retain: bool) -> Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix(&temp.prefix)
            .suffix(&temp.suffix)
            .tempfile_in(temp.dir())
            .or_raise(|| ErrorKind::Io)?;
        let bytes = io::copy(&mut source, &mut file).or_raise(|| ErrorKind::Io)?;
        file.flush().or_raise(|| ErrorKind::Io)?;
        tracing::debug!(path = %file.path().display(), bytes, retain, "Rendered HTML written to temporary file");
        if !retain {
            return Ok(Self::Temporary(file));
        }
        let (file, path) = file.keep().or_raise(|| ErrorKind::Io)?;
        tracing::info!(path = %path.display(), "Debug mode: rendered HTML will be kept on disk");
        Ok(Self::Retained { file, path })
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::Temporary(file) => file.path(),
            Self::Retained { path, .. } => path,
        }
    }

    pub fn is_retained(&self) -> bool {
        matches!(self, Self::Retained { .. })
    }

    /// Closes the handle and removes the file (unless retained), reporting
    /// any failure to remove it. Dropping does the same but silently.
    pub fn close(self) -> Result<()> {
        match self {
            Self::Temporary(file) => file.close().or_raise(|| ErrorKind::Io),
            Self::Retained { .. } => Ok(()),
        }
    }
}
impl AsRef<Path> for RenderedFile {
    fn as_ref(&self) -> &Path {
        self.path()
    }
}

use crate::error::{ErrorKind, Result};
use crate::options::ConversionOptions;
use exn::ResultExt;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::instrument;

/// Name of the executable looked up on `PATH` by [`Electron::discover`].
pub const EXECUTABLE: &str = "electron-pdf";

/// The [`electron-pdf`](https://github.com/fraserxu/electron-pdf) command-line tool.
#[derive(Clone, Debug)]
pub struct Electron {
    path: PathBuf,
}
impl Electron {
    pub fn discover() -> Result<Self> {
        Self::at(EXECUTABLE)
    }

    /// Resolves `executable` either as a path or as a name on `PATH`.
    pub fn at(executable: impl AsRef<OsStr>) -> Result<Self> {
        let executable = executable.as_ref();
        let path = which::which(executable)
            .or_raise(|| ErrorKind::ExecutableNotFound(executable.to_string_lossy().into_owned()))?;
        tracing::trace!(path = %path.display(), "Discovered electron-pdf executable");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `<executable> [options]... <input> <output>`, without any shell in between.
    pub(crate) fn command(&self, input: &Path, output: &Path, options: &ConversionOptions) -> Command {
        let mut command = Command::new(&self.path);
        command.args(options.to_args()).arg(input).arg(output);
        command
    }

    /// Runs the conversion and waits for it to finish.
    ///
    /// A non-zero exit (or termination by signal) is reported as
    /// [`ErrorKind::ConversionFailed`] carrying the tool's standard error,
    /// before anything tries to read the output file.
    #[instrument(skip(self, options), fields(input = %input.display(), output = %output.display(), options = options.len()))]
    pub fn execute(&self, input: &Path, output: &Path, options: &ConversionOptions) -> Result<()> {
        let result = self.command(input, output, options).output().or_raise(|| ErrorKind::Io)?;
        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr).trim().to_string();
            tracing::warn!(code = ?result.status.code(), "electron-pdf exited unsuccessfully");
            exn::bail!(ErrorKind::ConversionFailed { code: result.status.code(), stderr });
        }
        tracing::debug!("electron-pdf finished");
        Ok(())
    }
}

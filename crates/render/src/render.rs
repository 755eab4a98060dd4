use crate::error::{ErrorKind, Result};
use crate::options::ConversionOptions;
use crate::rendered::RenderedFile;
use crate::template::Context;
use crate::Renderer;
use exn::ResultExt;
use serde_json::Value;
use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use tracing::instrument;

/// The result of a conversion.
#[derive(Debug, PartialEq, Eq)]
pub enum Output {
    /// Raw PDF bytes; the intermediate output file has already been removed.
    Bytes(Vec<u8>),
    /// The PDF was written to the path the caller asked for.
    Persisted(PathBuf),
}
impl Output {
    /// Returns the PDF bytes, reading them from disk if they were persisted.
    pub fn into_bytes(self) -> Result<Vec<u8>> {
        match self {
            Self::Bytes(bytes) => Ok(bytes),
            Self::Persisted(path) => read_output(&path),
        }
    }
}

impl Renderer {
    /// Renders `template` with `context` and rewrites media/static URLs,
    /// returning the HTML that would be handed to `electron-pdf`.
    pub fn render_html(&self, template: &str, context: &Context, request: Option<&Value>) -> Result<String> {
        let content = self.templates.render(template, context, request)?;
        Ok(self.rewriter.rewrite(&content).into_owned())
    }

    /// Renders `template` with `context`, rewrites media/static URLs, and
    /// writes the result to a new temporary file.
    ///
    /// The file is kept on disk after the returned handle is dropped only when
    /// [`Settings::debug`](crate::Settings::debug) is enabled.
    #[instrument(skip(self, context, request))]
    pub fn render_to_temporary_file(
        &self,
        template: &str,
        context: &Context,
        request: Option<&Value>,
    ) -> Result<RenderedFile> {
        let content = self.render_html(template, context, request)?;
        RenderedFile::create(&content, &self.settings.temp, self.settings.debug)
    }

    /// Converts `input` to PDF.
    ///
    /// Options are the configured defaults merged with `overrides` (overrides
    /// win). Without `output` the PDF goes to a uniquely named temporary file
    /// that is read back and removed; with `output` the PDF is left there,
    /// replacing any file already at that path.
    #[instrument(skip(self, input, output, overrides), fields(input = %input.as_ref().display()))]
    pub fn electron_pdf(
        &self,
        input: impl AsRef<Path>,
        output: Option<&Path>,
        overrides: &ConversionOptions,
    ) -> Result<Output> {
        let options = self.settings.options.merged(overrides);
        match output {
            Some(output) => {
                remove_stale_output(output)?;
                self.electron.execute(input.as_ref(), output, &options)?;
                verify_output(output)?;
                Ok(Output::Persisted(output.to_path_buf()))
            },
            None => {
                let temp = &self.settings.temp;
                let output = tempfile::Builder::new()
                    .prefix(&temp.prefix)
                    .suffix(".pdf")
                    .tempfile_in(temp.dir())
                    .or_raise(|| ErrorKind::Io)?
                    .into_temp_path();
                self.electron.execute(input.as_ref(), &output, &options)?;
                let bytes = read_output(&output)?;
                output.close().or_raise(|| ErrorKind::Io)?;
                Ok(Output::Bytes(bytes))
            },
        }
    }

    /// Renders a template to PDF and returns the bytes. The intermediate HTML
    /// file is released before this returns, on success and on failure.
    pub fn render_pdf_from_template(
        &self,
        template: &str,
        context: &Context,
        request: Option<&Value>,
        overrides: &ConversionOptions,
    ) -> Result<Vec<u8>> {
        let input = self.render_to_temporary_file(template, context, request)?;
        let output = self.electron_pdf(&input, None, overrides)?;
        input.close()?;
        output.into_bytes()
    }

    /// Like [`render_pdf_from_template`](Self::render_pdf_from_template), but
    /// writes the PDF to `save_to`.
    pub fn render_pdf_from_template_to(
        &self,
        template: &str,
        context: &Context,
        request: Option<&Value>,
        overrides: &ConversionOptions,
        save_to: impl Into<PathBuf>,
    ) -> Result<Output> {
        let save_to = save_to.into();
        let input = self.render_to_temporary_file(template, context, request)?;
        let output = self.electron_pdf(&input, Some(&save_to), overrides)?;
        input.close()?;
        Ok(output)
    }
}

/// Reads PDF output as raw bytes, telling "never written" and "written but
/// empty" apart from other I/O failures.
fn read_output(path: &Path) -> Result<Vec<u8>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == IoErrorKind::NotFound => exn::bail!(ErrorKind::OutputMissing(path.to_path_buf())),
        Err(e) => return Err(e).or_raise(|| ErrorKind::Io),
    };
    if bytes.is_empty() {
        exn::bail!(ErrorKind::EmptyOutput(path.to_path_buf()));
    }
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "Read conversion output");
    Ok(bytes)
}

/// Removes a file left at `path` by an earlier run, so that only what the
/// tool writes this time can pass [`verify_output`].
fn remove_stale_output(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "Removed existing file at output path");
            Ok(())
        },
        Err(e) if e.kind() == IoErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).or_raise(|| ErrorKind::Io),
    }
}

fn verify_output(path: &Path) -> Result<()> {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == IoErrorKind::NotFound => exn::bail!(ErrorKind::OutputMissing(path.to_path_buf())),
        Err(e) => return Err(e).or_raise(|| ErrorKind::Io),
    };
    if metadata.len() == 0 {
        exn::bail!(ErrorKind::EmptyOutput(path.to_path_buf()));
    }
    Ok(())
}

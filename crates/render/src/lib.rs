//! Template-to-PDF rendering through the `electron-pdf` command-line tool.
//!
//! A [`Renderer`] renders a named template into HTML, rewrites media and
//! static URLs so that the external tool can load them from disk, writes the
//! HTML to a temporary file and hands that file to `electron-pdf`. Layout and
//! PDF encoding happen entirely inside the external process.
//!
//! ```no_run
//! use epdf_render::{ConversionOptions, Electron, Renderer, Settings, Templates};
//! # use epdf_render::error::Result;
//!
//! # fn example() -> Result<()> {
//! let renderer = Renderer::new(Settings::default(), Templates::builtin()?, Electron::discover()?)?;
//! let context = serde_json::json!({ "company_name": "Namespace OÜ" });
//! let pdf = renderer.render_pdf_from_template(
//!     "test.html",
//!     context.as_object().unwrap(),
//!     None,
//!     &ConversionOptions::new().with("pageSize", "A4"),
//! )?;
//! assert!(pdf.starts_with(b"%PDF-"));
//! # Ok(())
//! # }
//! ```

mod electron;
pub mod error;
mod options;
mod render;
mod rendered;
mod rewrite;
mod settings;
mod template;

use crate::error::Result;
pub use crate::electron::{EXECUTABLE, Electron};
pub use crate::options::{ConversionOptions, OptionValue};
pub use crate::render::Output;
pub use crate::rendered::{RenderedFile, TempFile};
pub use crate::rewrite::{UrlOverride, UrlRewriter, make_absolute_paths};
pub use crate::settings::{Settings, TempSettings};
pub use crate::template::{Context, Templates};

pub struct Renderer {
    electron: Electron,
    templates: Templates,
    rewriter: UrlRewriter,
    settings: Settings,
}
impl Renderer {
    /// Compiles the media/static URL overrides from `settings` up front, so a
    /// bad root directory fails here rather than on the first render.
    pub fn new(settings: Settings, templates: Templates, electron: Electron) -> Result<Self> {
        let rewriter = UrlRewriter::new([&settings.media, &settings.statics])?;
        Ok(Self { electron, templates, rewriter, settings })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn templates(&self) -> &Templates {
        &self.templates
    }

    pub fn electron(&self) -> &Electron {
        &self.electron
    }
}

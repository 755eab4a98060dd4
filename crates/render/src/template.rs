//! Template loading and rendering.
//!
//! Templates use [upon]'s Mustache-like syntax (`{{ value }}`,
//! `{{ value|formatter }}`, `{% if %}`, `{% for %}`, `{% include "name" %}`).
//! Every template is compiled when it is added, so syntax errors surface at
//! startup rather than in the middle of a request.
//!
//! Builtin templates are embedded at compile time from `assets/templates/`.
//! Templates loaded from a directory are named by their path relative to that
//! directory (always `/`-separated) and replace builtins of the same name.
//!
//! Every `{{ value }}` is HTML-escaped unless it is piped through `raw`
//! (`{{ body|raw }}`), for values that are already trusted markup. `escape`
//! is also registered so that the escaping can be spelled out.

use crate::error::{ErrorKind, Result};
use exn::{OptionExt, ResultExt};
use rust_embed::Embed;
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::instrument;
use upon::Engine;

/// Template variables, keyed by name.
pub type Context = Map<String, Value>;

#[derive(Embed)]
#[folder = "../../assets/templates/"]
struct Builtins;

/// A compiled set of named templates.
pub struct Templates {
    engine: Engine<'static>,
    names: BTreeSet<String>,
}
impl Default for Templates {
    fn default() -> Self {
        let mut engine = Engine::new();
        addons::configure(&mut engine);
        Self { engine, names: BTreeSet::new() }
    }
}
impl Templates {
    /// Creates an empty template set with the extensions registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a template set containing only the embedded builtins.
    pub fn builtin() -> Result<Self> {
        let mut templates = Self::new();
        for name in Builtins::iter() {
            // Infallible: the name was just yielded by the embedded iterator.
            let file = Builtins::get(&name).ok_or_raise(|| ErrorKind::TemplateNotFound(name.to_string()))?;
            let source = String::from_utf8(file.data.into_owned()).or_raise(|| ErrorKind::Template)?;
            templates.add(name.into_owned(), source)?;
        }
        Ok(templates)
    }

    /// Builtins first, then every template below `dir`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let mut templates = Self::builtin()?;
        templates.load_dir(dir)?;
        Ok(templates)
    }

    /// Compiles and registers a single template, replacing any existing
    /// template of the same name.
    pub fn add(&mut self, name: impl Into<String>, source: impl Into<String>) -> Result<()> {
        let name = name.into();
        self.engine.add_template(name.clone(), source.into()).or_raise(|| ErrorKind::Template)?;
        self.names.insert(name);
        Ok(())
    }

    /// Builder-style [`add`](Self::add).
    pub fn with(mut self, name: impl Into<String>, source: impl Into<String>) -> Result<Self> {
        self.add(name, source)?;
        Ok(self)
    }

    /// Recursively loads every file below `dir`, returning how many templates
    /// were registered. Files that are not valid UTF-8 (images, fonts) are skipped.
    #[instrument(skip_all, fields(dir = %dir.as_ref().display()))]
    pub fn load_dir(&mut self, dir: impl AsRef<Path>) -> Result<usize> {
        let root = dir.as_ref();
        let mut pending: Vec<PathBuf> = vec![root.to_path_buf()];
        let mut loaded = 0;
        while let Some(current) = pending.pop() {
            for entry in fs::read_dir(&current).or_raise(|| ErrorKind::Io)? {
                let entry = entry.or_raise(|| ErrorKind::Io)?;
                let path = entry.path();
                if entry.file_type().or_raise(|| ErrorKind::Io)?.is_dir() {
                    pending.push(path);
                    continue;
                }
                let Some(name) = template_name(root, &path) else {
                    tracing::debug!(path = %path.display(), "Skipping template with non-UTF-8 file name");
                    continue;
                };
                let Ok(source) = String::from_utf8(fs::read(&path).or_raise(|| ErrorKind::Io)?) else {
                    tracing::debug!(path = %path.display(), "Skipping non-UTF-8 file in template directory");
                    continue;
                };
                if self.names.contains(&name) {
                    tracing::debug!(template = %name, "Template overrides an existing template");
                }
                self.add(name, source)?;
                loaded += 1;
            }
        }
        tracing::debug!(loaded, "Loaded templates from directory");
        Ok(loaded)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Renders the named template. When a `request` is supplied it is exposed
    /// to the template as the `request` variable, replacing any context entry
    /// of the same name.
    #[instrument(skip(self, context, request), fields(variables = context.len()))]
    pub fn render(&self, name: &str, context: &Context, request: Option<&Value>) -> Result<String> {
        let template = self
            .engine
            .get_template(name)
            .ok_or_raise(|| ErrorKind::TemplateNotFound(name.to_string()))?;
        let context = match request {
            Some(request) => {
                let mut context = context.clone();
                context.insert("request".to_string(), request.clone());
                Cow::Owned(context)
            },
            None => Cow::Borrowed(context),
        };
        template.render(context.as_ref()).to_string().or_raise(|| ErrorKind::Template)
    }
}

/// `a/b/c.html` relative to the template root, regardless of platform separator.
fn template_name(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let segments = relative.components().map(|c| c.as_os_str().to_str()).collect::<Option<Vec<_>>>()?;
    Some(segments.join("/"))
}

/// Custom [`upon`] extensions for HTML output.
mod addons {
    use std::fmt::Write;
    use upon::{Engine, Value, fmt as upon_fmt};

    pub(super) fn escape_html(s: &str) -> String {
        let mut escaped = String::with_capacity(s.len());
        for c in s.chars() {
            match c {
                '&' => escaped.push_str("&amp;"),
                '<' => escaped.push_str("&lt;"),
                '>' => escaped.push_str("&gt;"),
                '"' => escaped.push_str("&quot;"),
                '\'' => escaped.push_str("&#x27;"),
                c => escaped.push(c),
            }
        }
        escaped
    }

    fn escape_formatter(f: &mut upon_fmt::Formatter<'_>, value: &Value) -> upon_fmt::Result {
        match value {
            Value::String(s) => write!(f, "{}", escape_html(s))?,
            v => upon_fmt::default(f, v)?,
        };
        Ok(())
    }

    /// Writes the value untouched, bypassing the escaping default formatter.
    fn raw_formatter(f: &mut upon_fmt::Formatter<'_>, value: &Value) -> upon_fmt::Result {
        upon_fmt::default(f, value)
    }

    pub(crate) fn configure(engine: &mut Engine<'_>) {
        engine.set_default_formatter(&escape_formatter);
        engine.add_formatter("escape", escape_formatter);
        engine.add_formatter("raw", raw_formatter);
    }
}

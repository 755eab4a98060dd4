//! Rewrites framework-relative media and static URLs into `file://` URLs.
//!
//! `electron-pdf` loads the rendered HTML from disk, so a reference such as
//! `<img src="/media/logo.png">` would resolve against the filesystem root
//! rather than the web server. Every quoted string that starts with a
//! configured URL prefix is rewritten to point at the matching file below the
//! configured root directory instead.
//!
//! This is a regex over quoted substrings, not an HTML parser. A prefix that
//! appears inside any quoted string is rewritten, attribute or not.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use url::Url;

static HAS_SCHEME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[^:/]+://").expect("valid regex"));

/// A `(root directory, URL prefix)` pair, e.g. `("/srv/app/media", "/media/")`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UrlOverride {
    pub root: PathBuf,
    pub url: String,
}
impl UrlOverride {
    pub fn new(root: impl Into<PathBuf>, url: impl Into<String>) -> Self {
        Self { root: root.into(), url: url.into() }
    }

    /// Overrides with an empty prefix, or a prefix that is already an absolute
    /// URL (served from a CDN, for example), are left alone.
    pub fn is_active(&self) -> bool {
        !self.url.is_empty() && !HAS_SCHEME.is_match(&self.url)
    }
}

struct Rule {
    pattern: Regex,
    prefix_len: usize,
    base: String,
}
impl Rule {
    fn compile(item: &UrlOverride) -> Result<Self> {
        let base = directory_url(&item.root)?;
        let pattern = Regex::new(&format!(r#"(["'])({}.*?)(["'])"#, regex::escape(&item.url)))
            .or_raise(|| ErrorKind::InvalidOverride(item.root.clone()))?;
        Ok(Self { pattern, prefix_len: item.url.len(), base })
    }

    fn apply<'a>(&self, content: &'a str) -> Cow<'a, str> {
        self.pattern.replace_all(content, |caps: &Captures<'_>| {
            format!("{}{}{}{}", &caps[1], self.base, &caps[2][self.prefix_len..], &caps[3])
        })
    }
}

/// Converts a directory into a `file://` URL with a trailing slash, applying
/// percent-encoding for spaces and non-ASCII characters.
fn directory_url(root: &Path) -> Result<String> {
    match Url::from_directory_path(root) {
        Ok(url) => Ok(url.into()),
        Err(()) => exn::bail!(ErrorKind::InvalidOverride(root.to_path_buf())),
    }
}

/// A compiled set of URL overrides, applied in order.
///
/// Compile once and reuse; see [`make_absolute_paths`] for the one-shot form.
#[derive(Default)]
pub struct UrlRewriter {
    rules: Vec<Rule>,
}
impl UrlRewriter {
    /// Compiles the given overrides, skipping inactive ones (see
    /// [`UrlOverride::is_active`]).
    ///
    /// Returns [`ErrorKind::InvalidOverride`] if an active override's root is
    /// not an absolute path.
    pub fn new<'a>(overrides: impl IntoIterator<Item = &'a UrlOverride>) -> Result<Self> {
        let mut rules = Vec::new();
        for item in overrides {
            if !item.is_active() {
                tracing::debug!(url = %item.url, "Skipping inactive URL override");
                continue;
            }
            rules.push(Rule::compile(item)?);
        }
        Ok(Self { rules })
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rewrite<'a>(&self, content: &'a str) -> Cow<'a, str> {
        let mut content = Cow::Borrowed(content);
        for rule in &self.rules {
            let rewritten = match rule.apply(&content) {
                Cow::Borrowed(_) => continue,
                Cow::Owned(rewritten) => rewritten,
            };
            content = Cow::Owned(rewritten);
        }
        content
    }
}

/// Rewrites media URLs, then static URLs, in `content`.
pub fn make_absolute_paths(content: &str, media: &UrlOverride, statics: &UrlOverride) -> Result<String> {
    let rewriter = UrlRewriter::new([media, statics])?;
    Ok(rewriter.rewrite(content).into_owned())
}

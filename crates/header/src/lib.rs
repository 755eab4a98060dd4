//! HTTP header values for serving rendered PDFs.
//!
//! The standard allows far more in a `Content-Disposition` filename than
//! browsers actually cope with (see <http://greenbytes.de/tech/tc2231/>), so
//! filenames are reduced to a quoted ASCII string with nothing that could be
//! mistaken for header syntax.

use std::borrow::Cow;
use std::fmt::{Display, Formatter, Result as FmtResult};

pub const CONTENT_TYPE: &str = "Content-Type";
pub const CONTENT_DISPOSITION: &str = "Content-Disposition";
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Whether non-ASCII characters are transliterated (`Ü` → `U`) rather than
/// replaced with `?`. Controlled by the `transliterate` cargo feature.
pub const TRANSLITERATION: bool = cfg!(feature = "transliterate");

/// Sanitizes a filename for the `Content-Disposition` header: semicolons and
/// double quotes are removed, then the result goes through [`http_quote`].
///
/// ```
/// use epdf_header::content_disposition_filename;
/// assert_eq!(content_disposition_filename(r#"a;b"c.pdf"#), r#""abc.pdf""#);
/// ```
pub fn content_disposition_filename(filename: &str) -> String {
    let stripped: String = filename.chars().filter(|c| !matches!(c, ';' | '"')).collect();
    http_quote(&stripped)
}

/// Reduces `value` to ASCII, escapes backslashes and double quotes, and wraps
/// the result in double quotes.
pub fn http_quote(value: &str) -> String {
    let ascii = to_ascii(value);
    format!("\"{}\"", ascii.replace('\\', "\\\\").replace('"', "\\\""))
}

#[cfg(feature = "transliterate")]
fn to_ascii(value: &str) -> Cow<'_, str> {
    if value.is_ascii() {
        return Cow::Borrowed(value);
    }
    // Transliteration is best-effort; anything left over is still replaced.
    Cow::Owned(replace_non_ascii(&deunicode::deunicode(value)).into_owned())
}

#[cfg(not(feature = "transliterate"))]
fn to_ascii(value: &str) -> Cow<'_, str> {
    replace_non_ascii(value)
}

fn replace_non_ascii(value: &str) -> Cow<'_, str> {
    if value.is_ascii() {
        return Cow::Borrowed(value);
    }
    Cow::Owned(value.chars().map(|c| if c.is_ascii() { c } else { '?' }).collect())
}

/// A complete `Content-Disposition` header value.
///
/// ```
/// use epdf_header::ContentDisposition;
/// assert_eq!(ContentDisposition::inline("test.pdf").to_string(), r#"inline; filename="test.pdf""#);
/// assert_eq!(ContentDisposition::attachment("a;b.pdf").to_string(), r#"attachment; filename="ab.pdf""#);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContentDisposition {
    filename: String,
    inline: bool,
}
impl ContentDisposition {
    /// `inline` asks the browser to display the PDF; otherwise it is
    /// downloaded as an attachment.
    pub fn new(filename: impl Into<String>, inline: bool) -> Self {
        Self { filename: filename.into(), inline }
    }

    pub fn inline(filename: impl Into<String>) -> Self {
        Self::new(filename, true)
    }

    pub fn attachment(filename: impl Into<String>) -> Self {
        Self::new(filename, false)
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn is_inline(&self) -> bool {
        self.inline
    }

    /// The `Content-Type` and `Content-Disposition` pairs for a PDF response.
    pub fn headers(&self) -> [(&'static str, String); 2] {
        [(CONTENT_TYPE, PDF_CONTENT_TYPE.to_string()), (CONTENT_DISPOSITION, self.to_string())]
    }
}
impl Display for ContentDisposition {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let kind = if self.inline { "inline" } else { "attachment" };
        write!(f, "{kind}; filename={}", content_disposition_filename(&self.filename))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("report.pdf", r#""report.pdf""#)]
    #[case(r#"a;b"c.pdf"#, r#""abc.pdf""#)]
    #[case(r"back\slash.pdf", r#""back\\slash.pdf""#)]
    #[case("", r#""""#)]
    #[cfg_attr(feature = "transliterate", case("Namespace OÜ.pdf", r#""Namespace OU.pdf""#))]
    #[cfg_attr(not(feature = "transliterate"), case("Namespace OÜ.pdf", r#""Namespace O?.pdf""#))]
    fn sanitizes_filenames(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(content_disposition_filename(input), expected);
    }

    #[rstest]
    #[case("report.pdf")]
    #[case("Quarterly Report 2024.pdf")]
    #[case("a-b_c.d.pdf")]
    fn sanitizing_is_idempotent(#[case] input: &str) {
        let once = content_disposition_filename(input);
        assert_eq!(content_disposition_filename(&once), once);
    }

    #[test]
    fn no_header_syntax_survives() {
        let quoted = content_disposition_filename(r#"x";y=1;"z.pdf"#);
        let inner = &quoted[1..quoted.len() - 1];
        assert!(!inner.contains(';'));
        assert!(!inner.replace("\\\"", "").contains('"'));
    }

    #[test]
    fn http_quote_escapes_quotes_and_backslashes() {
        assert_eq!(http_quote(r#"say "hi"\"#), r#""say \"hi\"\\""#);
    }

    #[test]
    fn result_is_ascii() {
        assert!(content_disposition_filename("日本語 ✓ naïve.pdf").is_ascii());
    }

    #[test]
    fn headers_for_pdf_response() {
        let [content_type, disposition] = ContentDisposition::attachment("test.pdf").headers();
        assert_eq!(content_type, ("Content-Type", "application/pdf".to_string()));
        assert_eq!(disposition, ("Content-Disposition", r#"attachment; filename="test.pdf""#.to_string()));
    }
}

//! End-to-end runs against stand-in `electron-pdf` shell scripts.
#![cfg(unix)]

use epdf_render::error::ErrorKind;
use epdf_render::{ConversionOptions, Context, Electron, Output, Renderer, Settings, TempSettings, Templates, UrlOverride};
use serde_json::json;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Writes a PDF header followed by the arguments it was called with.
const WORKING_TOOL: &str = r#"#!/bin/sh
for last; do :; done
printf '%%PDF-1.4\n' > "$last"
echo "$@" >> "$last"
"#;

const FAILING_TOOL: &str = "#!/bin/sh\necho 'cannot open display' >&2\nexit 3\n";

const SILENT_TOOL: &str = "#!/bin/sh\nexit 0\n";

/// Copies the HTML input (second to last argument) to `<output>.html`.
const CAPTURING_TOOL: &str = r#"#!/bin/sh
input=""
output=""
for arg; do input="$output"; output="$arg"; done
cp "$input" "$output.html"
printf '%%PDF-1.4\n' > "$output"
"#;

struct Fixture {
    _dir: TempDir,
    scratch: PathBuf,
    tool: PathBuf,
}
impl Fixture {
    fn new(script: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let scratch = dir.path().join("scratch");
        fs::create_dir(&scratch).unwrap();
        let tool = dir.path().join("electron-pdf");
        fs::write(&tool, script).unwrap();
        fs::set_permissions(&tool, fs::Permissions::from_mode(0o755)).unwrap();
        Self { _dir: dir, scratch, tool }
    }

    fn settings(&self, debug: bool) -> Settings {
        Settings {
            debug,
            temp: TempSettings { dir: Some(self.scratch.clone()), ..TempSettings::default() },
            ..Settings::default()
        }
    }

    fn renderer(&self, settings: Settings) -> Renderer {
        Renderer::new(settings, Templates::builtin().unwrap(), Electron::at(&self.tool).unwrap()).unwrap()
    }

    fn scratch_files(&self) -> Vec<PathBuf> {
        fs::read_dir(&self.scratch).unwrap().map(|e| e.unwrap().path()).collect()
    }
}

fn company() -> Context {
    json!({"company_name": "Namespace OÜ"}).as_object().unwrap().clone()
}

#[test]
fn renders_template_to_pdf_bytes_and_cleans_up() {
    let fixture = Fixture::new(WORKING_TOOL);
    let renderer = fixture.renderer(fixture.settings(false));
    let pdf = renderer.render_pdf_from_template("test.html", &company(), None, &ConversionOptions::new()).unwrap();
    assert!(pdf.starts_with(b"%PDF-"));
    assert!(fixture.scratch_files().is_empty(), "left behind: {:?}", fixture.scratch_files());
}

#[test]
fn debug_mode_keeps_rendered_html() {
    let fixture = Fixture::new(WORKING_TOOL);
    let renderer = fixture.renderer(fixture.settings(true));
    renderer.render_pdf_from_template("test.html", &company(), None, &ConversionOptions::new()).unwrap();
    let kept = fixture.scratch_files();
    assert_eq!(kept.len(), 1);
    assert!(kept[0].extension().is_some_and(|e| e == "html"));
    assert!(fs::read_to_string(&kept[0]).unwrap().contains("Namespace OÜ"));
}

#[test]
fn default_and_call_options_are_forwarded() {
    let fixture = Fixture::new(WORKING_TOOL);
    let mut settings = fixture.settings(false);
    settings.options = ConversionOptions::new().with("pageSize", "A4").with("landscape", false);
    let renderer = fixture.renderer(settings);
    let overrides = ConversionOptions::new().with("landscape", true).with("printBackground", true);
    let pdf = renderer.render_pdf_from_template("test.html", &company(), None, &overrides).unwrap();
    let text = String::from_utf8(pdf).unwrap();
    assert!(text.contains("--landscape --pageSize=A4 --printBackground "));
}

#[test]
fn non_zero_exit_is_a_conversion_failure() {
    let fixture = Fixture::new(FAILING_TOOL);
    let renderer = fixture.renderer(fixture.settings(false));
    let err = renderer
        .render_pdf_from_template("test.html", &company(), None, &ConversionOptions::new())
        .unwrap_err();
    match &*err {
        ErrorKind::ConversionFailed { code, stderr } => {
            assert_eq!(*code, Some(3));
            assert_eq!(stderr, "cannot open display");
        },
        other => panic!("expected ConversionFailed, got {other:?}"),
    }
    assert!(fixture.scratch_files().is_empty());
}

#[test]
fn successful_exit_without_output_is_reported() {
    let fixture = Fixture::new(SILENT_TOOL);
    let renderer = fixture.renderer(fixture.settings(false));
    let target = fixture.scratch.join("never-written.pdf");
    let input = renderer.render_to_temporary_file("test.html", &company(), None).unwrap();
    let err = renderer.electron_pdf(&input, Some(&target), &ConversionOptions::new()).unwrap_err();
    assert!(matches!(&*err, ErrorKind::OutputMissing(path) if path == &target));
    // The temporary output file exists but stays empty.
    let err = renderer.electron_pdf(&input, None, &ConversionOptions::new()).unwrap_err();
    assert!(matches!(&*err, ErrorKind::EmptyOutput(_)));
}

#[test]
fn earlier_output_does_not_mask_a_silent_tool() {
    let fixture = Fixture::new(SILENT_TOOL);
    let renderer = fixture.renderer(fixture.settings(false));
    let target = fixture.scratch.join("report.pdf");
    fs::write(&target, b"%PDF-1.4\nfrom yesterday\n").unwrap();
    let err = renderer
        .render_pdf_from_template_to("test.html", &company(), None, &ConversionOptions::new(), &target)
        .unwrap_err();
    assert!(matches!(&*err, ErrorKind::OutputMissing(path) if path == &target));
    assert!(fixture.scratch_files().is_empty());
}

#[test]
fn escapes_context_values_in_rendered_html() {
    let fixture = Fixture::new(CAPTURING_TOOL);
    let renderer = fixture.renderer(fixture.settings(false));
    let context = json!({"company_name": "<script>alert(1)</script>"}).as_object().unwrap().clone();
    renderer.render_pdf_from_template("test.html", &context, None, &ConversionOptions::new()).unwrap();
    let captured = fixture.scratch_files();
    assert_eq!(captured.len(), 1);
    let html = fs::read_to_string(&captured[0]).unwrap();
    assert!(!html.contains("<script>"));
    assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
}

#[test]
fn persists_to_requested_path() {
    let fixture = Fixture::new(WORKING_TOOL);
    let renderer = fixture.renderer(fixture.settings(false));
    let target = fixture.scratch.join("out.pdf");
    let output = renderer
        .render_pdf_from_template_to("test.html", &company(), None, &ConversionOptions::new(), &target)
        .unwrap();
    assert_eq!(output, Output::Persisted(target.clone()));
    assert!(fs::read(&target).unwrap().starts_with(b"%PDF-"));
    assert_eq!(fixture.scratch_files(), vec![target]);
}

#[test]
fn tool_receives_rewritten_html() {
    let fixture = Fixture::new(CAPTURING_TOOL);
    let mut settings = fixture.settings(false);
    settings.media = UrlOverride::new("/srv/app/media", "/media/");
    let templates = Templates::new().with("logo.html", r#"<img src="/media/{{ logo }}">"#).unwrap();
    let renderer = Renderer::new(settings, templates, Electron::at(&fixture.tool).unwrap()).unwrap();
    let context = json!({"logo": "logo.png"}).as_object().unwrap().clone();
    renderer.render_pdf_from_template("logo.html", &context, None, &ConversionOptions::new()).unwrap();
    let captured = fixture.scratch_files();
    assert_eq!(captured.len(), 1);
    assert!(captured[0].to_str().unwrap().ends_with(".pdf.html"));
    assert_eq!(fs::read_to_string(&captured[0]).unwrap(), r#"<img src="file:///srv/app/media/logo.png">"#);
}

#[test]
fn relative_media_root_fails_at_construction() {
    let fixture = Fixture::new(WORKING_TOOL);
    let mut settings = fixture.settings(false);
    settings.media = UrlOverride::new(Path::new("media"), "/media/");
    let result = Renderer::new(settings, Templates::new(), Electron::at(&fixture.tool).unwrap());
    assert!(result.is_err());
}

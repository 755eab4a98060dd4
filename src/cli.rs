//! Command-line definitions.

use clap::{ArgAction, Args, Parser, Subcommand};
use epdf_render::{ConversionOptions, OptionValue};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "epdf", version, about = "Render templates to PDF through electron-pdf")]
pub struct Cli {
    /// Configuration file (.toml, .yaml, .yml or .json).
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Keep rendered HTML files on disk, overriding the configuration.
    #[arg(long, global = true)]
    pub debug: bool,
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). `RUST_LOG` wins when set.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Render a template to PDF.
    Render(RenderArgs),
    /// Convert an existing HTML file to PDF.
    Convert(ConvertArgs),
    /// Print the rewritten HTML a template renders to.
    Html(HtmlArgs),
    /// Print the response headers for serving a PDF under the given filename.
    Header(HeaderArgs),
}

#[derive(Debug, Args)]
pub struct RenderArgs {
    /// Template name, e.g. `invoices/detail.html`.
    pub template: String,
    #[command(flatten)]
    pub context: ContextArgs,
    /// Write the PDF here instead of to stdout.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
    #[command(flatten)]
    pub options: OptionArgs,
}

#[derive(Debug, Args)]
pub struct ConvertArgs {
    /// HTML file to convert.
    pub input: PathBuf,
    /// Write the PDF here instead of to stdout.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
    #[command(flatten)]
    pub options: OptionArgs,
}

#[derive(Debug, Args)]
pub struct HtmlArgs {
    pub template: String,
    #[command(flatten)]
    pub context: ContextArgs,
}

#[derive(Debug, Args)]
pub struct HeaderArgs {
    pub filename: String,
    /// Force a download instead of displaying the PDF in the browser.
    #[arg(long)]
    pub attachment: bool,
}

#[derive(Debug, Args)]
pub struct ContextArgs {
    /// JSON object of template variables; `-` reads from stdin.
    #[arg(short, long, value_name = "FILE")]
    pub context: Option<PathBuf>,
    /// JSON value exposed to templates as `request`.
    #[arg(long, value_name = "FILE")]
    pub request: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct OptionArgs {
    /// Option forwarded to electron-pdf, overriding the configured default.
    #[arg(short = 'O', long = "option", value_name = "KEY=VALUE", value_parser = parse_option)]
    pub options: Vec<(String, OptionValue)>,
}
impl OptionArgs {
    pub fn to_options(&self) -> ConversionOptions {
        self.options.iter().cloned().collect()
    }
}

/// `key=value`, or a bare `key` as shorthand for `key=true`.
fn parse_option(s: &str) -> Result<(String, OptionValue), String> {
    let (key, value) = match s.split_once('=') {
        Some((key, value)) => {
            let Ok(value) = value.parse::<OptionValue>();
            (key.trim(), value)
        },
        None => (s.trim(), OptionValue::Flag(true)),
    };
    let key = key.trim_start_matches("--");
    if key.is_empty() {
        return Err(format!("missing option name in `{s}`"));
    }
    Ok((key.to_string(), value))
}

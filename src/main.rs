mod cli;
mod error;

use crate::cli::{Cli, Command, ContextArgs, ConvertArgs, HeaderArgs, HtmlArgs, RenderArgs};
use crate::error::{ErrorKind, Result};
use clap::Parser;
use epdf_config::Config;
use epdf_header::ContentDisposition;
use epdf_render::{Context, Electron, Output, Renderer, Templates, UrlRewriter};
use exn::ResultExt;
use serde_json::Value;
use std::io::{Read, Write};
use std::path::Path;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::FAILURE
        },
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    // Stdout may carry PDF bytes; logs always go to stderr.
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn run(cli: Cli) -> Result<()> {
    let config = || load_config(cli.config.as_deref(), cli.debug);
    match cli.command {
        Command::Render(args) => render(&config()?, args),
        Command::Convert(args) => convert(&config()?, args),
        Command::Html(args) => html(&config()?, args),
        Command::Header(args) => header(&args),
    }
}

fn load_config(path: Option<&Path>, debug: bool) -> Result<Config> {
    let mut config = Config::load(path).or_raise(|| ErrorKind::Config)?;
    config.render.debug |= debug;
    tracing::debug!(?config, "Configuration loaded");
    Ok(config)
}

fn templates(config: &Config) -> Result<Templates> {
    let templates = match &config.templates {
        Some(dir) => Templates::from_dir(dir),
        None => Templates::builtin(),
    };
    templates.or_raise(|| ErrorKind::Render)
}

fn renderer(config: &Config) -> Result<Renderer> {
    let electron = Electron::at(&config.executable).or_raise(|| ErrorKind::Render)?;
    Renderer::new(config.render.clone(), templates(config)?, electron).or_raise(|| ErrorKind::Render)
}

fn render(config: &Config, args: RenderArgs) -> Result<()> {
    let renderer = renderer(config)?;
    let (context, request) = load_context(&args.context)?;
    let overrides = args.options.to_options();
    match args.output {
        Some(path) => {
            renderer
                .render_pdf_from_template_to(&args.template, &context, request.as_ref(), &overrides, &path)
                .or_raise(|| ErrorKind::Render)?;
            tracing::info!(path = %path.display(), "PDF written");
            Ok(())
        },
        None => {
            let pdf = renderer
                .render_pdf_from_template(&args.template, &context, request.as_ref(), &overrides)
                .or_raise(|| ErrorKind::Render)?;
            write_stdout(&pdf)
        },
    }
}

fn convert(config: &Config, args: ConvertArgs) -> Result<()> {
    let renderer = renderer(config)?;
    let output = renderer
        .electron_pdf(&args.input, args.output.as_deref(), &args.options.to_options())
        .or_raise(|| ErrorKind::Render)?;
    match output {
        Output::Bytes(pdf) => write_stdout(&pdf),
        Output::Persisted(path) => {
            tracing::info!(path = %path.display(), "PDF written");
            Ok(())
        },
    }
}

/// Doesn't need `electron-pdf` installed; only templates and URL rewriting.
fn html(config: &Config, args: HtmlArgs) -> Result<()> {
    let templates = templates(config)?;
    let rewriter =
        UrlRewriter::new([&config.render.media, &config.render.statics]).or_raise(|| ErrorKind::Render)?;
    let (context, request) = load_context(&args.context)?;
    let content = templates
        .render(&args.template, &context, request.as_ref())
        .or_raise(|| ErrorKind::Render)?;
    write_stdout(rewriter.rewrite(&content).as_bytes())
}

fn header(args: &HeaderArgs) -> Result<()> {
    if !epdf_header::TRANSLITERATION {
        tracing::debug!("Transliteration unavailable; non-ASCII filename characters become `?`");
    }
    let disposition = ContentDisposition::new(&args.filename, !args.attachment);
    let mut lines = String::new();
    for (name, value) in disposition.headers() {
        lines.push_str(&format!("{name}: {value}\n"));
    }
    write_stdout(lines.as_bytes())
}

fn load_context(args: &ContextArgs) -> Result<(Context, Option<Value>)> {
    let context = match &args.context {
        Some(path) => match read_json(path)? {
            Value::Object(map) => map,
            _ => exn::bail!(ErrorKind::Context(path.clone())),
        },
        None => Context::new(),
    };
    let request = args.request.as_deref().map(read_json).transpose()?;
    Ok((context, request))
}

fn read_json(path: &Path) -> Result<Value> {
    let mut raw = String::new();
    if path == Path::new("-") {
        std::io::stdin().read_to_string(&mut raw).or_raise(|| ErrorKind::Context(path.to_path_buf()))?;
    } else {
        raw = std::fs::read_to_string(path).or_raise(|| ErrorKind::Context(path.to_path_buf()))?;
    }
    serde_json::from_str(&raw).or_raise(|| ErrorKind::Context(path.to_path_buf()))
}

fn write_stdout(bytes: &[u8]) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(bytes).or_raise(|| ErrorKind::Output)?;
    stdout.flush().or_raise(|| ErrorKind::Output)
}

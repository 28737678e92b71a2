//! CSS-plus command line front end.
//!
//! Applies a CSS-plus stylesheet to an HTML document, writes the
//! transformed HTML, and optionally the residual stylesheet and the
//! coverage map.
//!
//! Usage:
//!   cssplus book.css book.html                      Print the transformed HTML
//!   cssplus book.css book.html -o out.html --css-out out.css
//!   cssplus book.css book.html --coverage-out coverage.json -v

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use cssplus_common::{Diagnostic, Severity};
use cssplus_engine::{EngineConfig, HashMode, process};
use owo_colors::OwoColorize;

/// CSS-plus: transform HTML with custom pseudo-elements, functions and
/// declarations
#[derive(Parser, Debug)]
#[command(name = "cssplus")]
#[command(author, version, about, long_about = None)]
#[command(after_help = r"EXAMPLES:
    # Print the transformed document
    cssplus book.css book.html

    # Write the document and the residual stylesheet
    cssplus book.css book.html -o out.html --css-out out.css

    # One residual rule per declaration site
    cssplus book.css book.html --hash-mode provenance

    # Accept :after as ::after for older stylesheets
    cssplus --legacy-pseudo-elements old.css book.html
")]
struct Cli {
    /// CSS-plus stylesheet
    #[arg(value_name = "CSS")]
    css: PathBuf,

    /// HTML document to transform
    #[arg(value_name = "HTML")]
    html: PathBuf,

    /// Write the transformed HTML here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Write the residual stylesheet here
    #[arg(long, value_name = "FILE")]
    css_out: Option<PathBuf>,

    /// Write selector and declaration coverage as JSON here
    #[arg(long, value_name = "FILE")]
    coverage_out: Option<PathBuf>,

    /// How residual declarations are keyed: content or provenance
    #[arg(long, value_name = "MODE")]
    hash_mode: Option<HashMode>,

    /// Treat :name as ::name for registered pseudo-elements
    #[arg(long)]
    legacy_pseudo_elements: bool,

    /// JSON engine configuration; flags override it
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log engine activity to stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(&cli)?;
    let css = read(&cli.css)?;
    let html = read(&cli.html)?;

    match process(&css, &html, &config) {
        Ok(output) => {
            render_diagnostics(&cli, &output.diagnostics);
            match &cli.output {
                Some(path) => write(path, &output.html)?,
                None => println!("{}", output.html),
            }
            if let Some(path) = &cli.css_out {
                write(path, &output.residual_css)?;
            }
            if let Some(path) = &cli.coverage_out {
                write(path, &output.coverage.to_json()?)?;
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(failure) => {
            render_diagnostics(&cli, &failure.diagnostics);
            log::debug!("run failed: {}", failure.error);
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Diagnostics are rendered separately, so logging stays off unless asked
/// for.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "off",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

/// The config file, if any, with command line flags applied on top.
fn load_config(cli: &Cli) -> anyhow::Result<EngineConfig> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_json(&read(path)?)
            .with_context(|| format!("invalid configuration in {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(mode) = cli.hash_mode {
        config.hash_mode = mode;
    }
    if cli.legacy_pseudo_elements {
        config.legacy_pseudo_elements = true;
    }
    log::info!("configuration: {config:?}");
    Ok(config)
}

fn read(path: &Path) -> anyhow::Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn write(path: &Path, contents: &str) -> anyhow::Result<()> {
    fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}

/// `book.css:3:5: WARN: message (book.html:10:1)`
fn render_diagnostics(cli: &Cli, diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        let severity = diagnostic.severity.to_string();
        let severity = match diagnostic.severity {
            Severity::Bug | Severity::Error => severity.red().bold().to_string(),
            Severity::Warn => severity.yellow().bold().to_string(),
            Severity::Log => severity.cyan().to_string(),
        };
        let mut line = match diagnostic.css {
            Some(at) => format!("{}:{at}: ", cli.css.display()).bold().to_string(),
            None => String::new(),
        };
        line.push_str(&format!("{severity}: {}", diagnostic.message));
        if let Some(at) = diagnostic.html {
            line.push_str(&format!(" ({}:{at})", cli.html.display()).dimmed().to_string());
        }
        eprintln!("{line}");
    }
}

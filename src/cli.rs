//! Command-line interface for surfacer.

use clap::{Parser, Subcommand};
use colored::*;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{self, ExtractorConfig};
use crate::extractor::{ExtractionResult, Extractor};
use crate::messages::{ExtractorMessage, Severity};

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Default config file names to search for.
const DEFAULT_CONFIG_NAMES: &[&str] = &["surfacer.yaml", ".surfacer.yaml"];

/// API surface extractor - reviewable API snapshots for TypeScript packages.
///
/// Surfacer analyses the exports of a package entry point and produces two
/// artifacts: a review file (a canonical, diff-friendly snapshot of every
/// exported declaration) and a machine-readable API model for downstream
/// documentation tooling.
#[derive(Parser)]
#[command(name = "surfacer")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract the API surface of a package
    #[command(visible_alias = "run")]
    Extract(ExtractArgs),
    /// Create a surfacer.yaml config from the template
    Init(InitArgs),
}

/// Arguments for the extract command.
#[derive(Parser)]
pub struct ExtractArgs {
    /// Entry module path (default: from config)
    pub entry: Option<PathBuf>,

    /// Path to the config YAML file (default: auto-discover)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Review file output path (overrides config)
    #[arg(long)]
    pub review_file: Option<PathBuf>,

    /// API model output path (overrides config)
    #[arg(long)]
    pub model_file: Option<PathBuf>,

    /// Message output format: pretty or json
    #[arg(short, long, default_value = "pretty")]
    pub format: String,

    /// Local build: warnings are reported but do not fail the run
    #[arg(long)]
    pub local: bool,

    /// Print the analyzed declaration graph to stderr
    #[arg(long)]
    pub dump_graph: bool,
}

/// Arguments for the init command.
#[derive(Parser)]
pub struct InitArgs {
    /// Output file path
    #[arg(short, long, default_value = "surfacer.yaml")]
    pub output: PathBuf,
}

const CONFIG_TEMPLATE: &str = include_str!("templates/surfacer.yaml");

/// Discover a config file in the current directory.
fn discover_config() -> Option<PathBuf> {
    DEFAULT_CONFIG_NAMES
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
}

/// Run the extract command.
pub fn run_extract(args: &ExtractArgs) -> anyhow::Result<i32> {
    if args.format != "pretty" && args.format != "json" {
        eprintln!(
            "Error: invalid format {:?}, must be 'pretty' or 'json'",
            args.format
        );
        return Ok(EXIT_ERROR);
    }

    let config = match &args.config {
        Some(path) => match ExtractorConfig::parse_file(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error parsing config: {}", e);
                return Ok(EXIT_ERROR);
            }
        },
        None => match discover_config() {
            Some(path) => match ExtractorConfig::parse_file(&path) {
                Ok(c) => c,
                Err(e) => {
                    eprintln!("Error parsing config: {}", e);
                    return Ok(EXIT_ERROR);
                }
            },
            None => ExtractorConfig::default(),
        },
    };

    if let Err(e) = config::validate(&config) {
        eprintln!("Error: invalid config: {}", e);
        return Ok(EXIT_ERROR);
    }

    let entry = match args.entry.clone().or_else(|| config.entry_point.clone()) {
        Some(entry) => entry,
        None => {
            eprintln!("Error: no entry point given (pass one or set entry_point in surfacer.yaml)");
            return Ok(EXIT_ERROR);
        }
    };

    let review_path = args.review_file.clone().or_else(|| config.review_file.clone());
    let model_path = args.model_file.clone().or_else(|| config.model_file.clone());

    let extractor = Extractor::new(config)
        .local_build(args.local)
        .dump_graph(args.dump_graph);

    let result = match extractor.run(&entry) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    if let Some(dump) = &result.graph_dump {
        eprint!("{}", dump);
    }

    let review_path =
        review_path.unwrap_or_else(|| PathBuf::from(format!("{}.api.ts", result.package_name)));
    let model_path =
        model_path.unwrap_or_else(|| PathBuf::from(format!("{}.api.json", result.package_name)));

    write_artifact(&review_path, &result.review_text)?;
    write_artifact(&model_path, &result.model_json)?;

    match args.format.as_str() {
        "json" => write_json_report(&result)?,
        _ => write_pretty_report(&entry, &review_path, &model_path, &result, args.local),
    }

    if result.succeeded(args.local) {
        Ok(EXIT_SUCCESS)
    } else {
        Ok(EXIT_FAILED)
    }
}

fn write_artifact(path: &Path, content: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, content)?;
    Ok(())
}

/// Machine-readable message listing.
#[derive(serde::Serialize)]
struct JsonReport<'a> {
    version: String,
    package: &'a str,
    errors: usize,
    warnings: usize,
    messages: &'a [ExtractorMessage],
}

fn write_json_report(result: &ExtractionResult) -> anyhow::Result<()> {
    let report = JsonReport {
        version: env!("CARGO_PKG_VERSION").to_string(),
        package: &result.package_name,
        errors: result.error_count,
        warnings: result.warning_count,
        messages: &result.messages,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn write_pretty_report(
    entry: &Path,
    review_path: &Path,
    model_path: &Path,
    result: &ExtractionResult,
    local: bool,
) {
    println!();
    print!("  ");
    print!("{}", "surfacer".cyan().bold());
    println!(" v{}", env!("CARGO_PKG_VERSION"));
    println!();

    print!("  {}", "Entry:  ".dimmed());
    println!("{}", entry.display());
    print!("  {}", "Review: ".dimmed());
    println!("{}", review_path.display());
    print!("  {}", "Model:  ".dimmed());
    println!("{}", model_path.display());
    println!();

    if !result.messages.is_empty() {
        println!("  {} ({}):", "Messages".bold(), result.messages.len());
        println!();
        for message in &result.messages {
            write_severity_tag(message.severity);
            print!("   ");
            print!("{:<24}", message.id.as_str().dimmed());
            print!("{}", message.file.blue());
            if message.line > 0 {
                print!("{}", format!(":{}:{}", message.line, message.col).dimmed());
            }
            println!();
            println!("            {}", message.text);
            println!();
        }
    }

    if result.succeeded(local) {
        print!("  {}", "✓ PASS".green());
    } else {
        print!("  {}", "✗ FAIL".red());
    }
    print!(
        "  {} error{}, {} warning{}",
        result.error_count,
        plural(result.error_count),
        result.warning_count,
        plural(result.warning_count)
    );
    if local && result.warning_count > 0 {
        print!("  {}", "(local build, warnings allowed)".dimmed());
    }
    println!();
    println!();
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

fn write_severity_tag(severity: Severity) {
    match severity {
        Severity::Error => print!("    {} ", "ERROR".red()),
        Severity::Warning => print!("    {} ", "WARN ".yellow()),
    }
}

/// Run the init command.
pub fn run_init(args: &InitArgs) -> anyhow::Result<i32> {
    if args.output.exists() {
        eprintln!("Error: file already exists: {}", args.output.display());
        eprintln!("Remove it or use --output to specify a different path");
        return Ok(EXIT_ERROR);
    }

    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() && parent != Path::new(".") {
            if let Err(e) = fs::create_dir_all(parent) {
                eprintln!("Error: failed to create directory: {}", e);
                return Ok(EXIT_ERROR);
            }
        }
    }

    if let Err(e) = fs::write(&args.output, CONFIG_TEMPLATE) {
        eprintln!("Error: failed to write config: {}", e);
        return Ok(EXIT_ERROR);
    }

    println!("Created {}", args.output.display());
    println!();
    println!("Next steps:");
    println!("  1. Edit {} to point at your entry module", args.output.display());
    println!("  2. Run: surfacer extract");

    Ok(EXIT_SUCCESS)
}

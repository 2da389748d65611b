//! Command-line entry point: export the enclosure solids, validate them
//! and report.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use cavityfit::check::UnverifiablePolicy;
use cavityfit::error::ExportError;
use cavityfit::export::{discover_existing, find_openscad, Exporter};
use cavityfit::report::ReportRenderer;
use cavityfit::{CavityFitError, MeshSources, ValidationConfig, ValidationReport, Validator};

/// Geometric fit validation for speaker enclosure components.
#[derive(Parser, Debug)]
#[command(name = "cavityfit", version, about, long_about = None)]
struct Args {
    /// Path to the OpenSCAD binary.
    #[arg(long, value_name = "PATH")]
    openscad: Option<PathBuf>,

    /// Reuse meshes already in the output directory.
    #[arg(long)]
    skip_export: bool,

    /// Show mesh statistics, volumes and debug logs.
    #[arg(short, long)]
    verbose: bool,

    /// Enclosure model to export.
    #[arg(long, value_name = "FILE", default_value = "speedster-ai.scad")]
    scad: PathBuf,

    /// Directory for exported meshes.
    #[arg(long, value_name = "DIR", default_value = "tmp/validation")]
    out_dir: PathBuf,

    /// JSON file overriding the component registry and tolerances.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Also write the report as JSON.
    #[arg(long, value_name = "FILE")]
    json: Option<PathBuf>,

    /// Fail collision pairs whose geometry cannot be verified.
    #[arg(long)]
    fail_closed: bool,
}

/// Exit status for setup, export and cavity failures.
const SETUP_FAILURE: u8 = 2;

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    println!("{}", "Enclosure Geometric Fit Validation".bold());
    println!("{}\n", "=".repeat(34));

    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            eprintln!("{}", format!("FATAL: {err}").red());
            if let CavityFitError::Export(
                ExportError::Failed { diagnostics: lines, .. }
                | ExportError::Assertion { lines, .. },
            ) = &err
            {
                for line in lines {
                    eprintln!("  {}", line.red());
                }
            }
            ExitCode::from(SETUP_FAILURE)
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "warn,cavityfit=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Returns the overall verdict, or an error for setup failures.
fn run(args: &Args) -> Result<bool, CavityFitError> {
    let mut config = match &args.config {
        Some(path) => ValidationConfig::load(path)?,
        None => ValidationConfig::default(),
    };
    if args.fail_closed {
        config.checks.unverifiable = UnverifiablePolicy::FailClosed;
    }

    let sources = obtain_meshes(args, &config)?;

    println!("\n{}", "Loading meshes...".bold());
    let start = Instant::now();
    let report = Validator::new(config).run(&sources)?;
    let elapsed = start.elapsed();

    print!(
        "{}",
        ReportRenderer::new().with_verbose(args.verbose).render(&report)
    );
    println!("\nValidation completed in {:.1}s", elapsed.as_secs_f64());

    if let Some(path) = &args.json {
        write_json(path, &report);
    }
    Ok(report.passed())
}

fn obtain_meshes(args: &Args, config: &ValidationConfig) -> Result<MeshSources, CavityFitError> {
    if args.skip_export {
        println!("Skipping STL export, using existing files...");
        return Ok(discover_existing(config, &args.out_dir));
    }

    let tool = args
        .openscad
        .clone()
        .or_else(find_openscad)
        .ok_or(ExportError::ToolNotFound)?;

    println!("Exporting STLs via OpenSCAD...");
    let start = Instant::now();
    let sources = Exporter::new(tool, &args.scad).export_all(config, &args.out_dir)?;
    println!("Export complete ({:.1}s)", start.elapsed().as_secs_f64());
    Ok(sources)
}

/// The JSON copy is a convenience; failing to write it does not change
/// the verdict.
fn write_json(path: &Path, report: &ValidationReport) {
    let written = serde_json::to_string_pretty(report)
        .map_err(|e| e.to_string())
        .and_then(|json| fs::write(path, json).map_err(|e| e.to_string()));
    if let Err(err) = written {
        eprintln!(
            "{}",
            format!("WARNING: could not write {}: {err}", path.display()).yellow()
        );
    }
}

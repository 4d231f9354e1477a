use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;

use turbine_pipeline::error::PipelineError;
use turbine_pipeline::logging;
use turbine_pipeline::{Pipeline, PipelineConfig, PipelineResult, ValidationReport};

#[derive(Parser)]
#[command(name = "turbine_pipeline")]
#[command(about = "Cleans, summarises and flags wind turbine power readings")]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true, env = "TURBINE_CONFIG")]
    config: Option<PathBuf>,

    /// Directory scanned for .csv input files
    #[arg(long, global = true, env = "TURBINE_INPUT_DIR")]
    input_dir: Option<PathBuf>,

    /// Directory receiving the output tables and chart
    #[arg(long, global = true, env = "TURBINE_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Also write a JSON log to this directory
    #[arg(long, global = true, env = "TURBINE_LOG_DIR")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run ingest, clean, summarize, detect and persist
    Run {
        /// Print the run report as JSON on stdout
        #[arg(long)]
        json: bool,
    },
    /// Ingest and clean only, reporting counts without writing outputs
    Validate {
        #[arg(long)]
        json: bool,
    },
}

/// Defaults, then the config file, then command line / environment overrides.
fn build_config(cli: &Cli) -> Result<PipelineConfig, PipelineError> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(dir) = &cli.input_dir {
        config.input_dir = dir.clone();
    }
    if let Some(dir) = &cli.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(dir) = &cli.log_dir {
        config.log_dir = Some(dir.clone());
    }
    config.validate()?;
    Ok(config)
}

fn print_json<T: Serialize>(report: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(report).context("failed to serialize run report")?;
    println!("{json}");
    Ok(())
}

fn print_run(result: &PipelineResult) {
    println!("\n📊 Pipeline Results:");
    println!("   Rows ingested: {}", result.rows_ingested);
    println!("   Values imputed: {}", result.values_imputed);
    println!("   Rows retained: {}", result.rows_retained);
    println!("   Rows dropped as outliers: {}", result.rows_dropped);
    println!("   Turbines summarized: {}", result.turbines_summarized);
    println!("   Anomalies flagged: {}", result.anomalies_flagged);
    println!("   Outputs:");
    println!("     {}", result.outputs.cleaned_data.display());
    println!("     {}", result.outputs.summary_statistics.display());
    println!("     {}", result.outputs.anomalies.display());
    println!("     {}", result.outputs.chart.display());
}

fn print_validation(report: &ValidationReport) {
    println!("\n🔎 Validation Results:");
    println!("   Input files: {}", report.files_found);
    println!("   Columns: {}", report.columns.join(", "));
    println!("   Rows ingested: {}", report.rows_ingested);
    println!("   Values imputed: {}", report.values_imputed);
    println!("   Rows that would be retained: {}", report.rows_retained);
    println!("   Rows that would be dropped: {}", report.rows_dropped);
    if let (Some(mean), Some(std_dev)) = (report.global_mean, report.global_std_dev) {
        println!("   Global mean / std dev: {mean:.4} / {std_dev:.4}");
    }
}

fn fail(e: &PipelineError) -> ExitCode {
    error!(stage = e.stage(), "Pipeline execution failed: {}", e);
    eprintln!("❌ Pipeline execution failed: {e}");
    ExitCode::from(e.exit_code())
}

fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {e}");
            return ExitCode::from(e.exit_code());
        }
    };

    let _log_guard = logging::init_logging(config.log_dir.as_deref());
    let pipeline = Pipeline::new(config);

    let outcome = match cli.command.unwrap_or(Commands::Run { json: false }) {
        Commands::Run { json } => match pipeline.run() {
            Ok(result) if json => print_json(&result),
            Ok(result) => {
                print_run(&result);
                println!("✅ Pipeline executed successfully");
                Ok(())
            }
            Err(e) => return fail(&e),
        },
        Commands::Validate { json } => match pipeline.validate() {
            Ok(report) if json => print_json(&report),
            Ok(report) => {
                print_validation(&report);
                Ok(())
            }
            Err(e) => return fail(&e),
        },
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ {e:#}");
            ExitCode::FAILURE
        }
    }
}

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

mod aggregator;
mod analyzer;
mod config;
mod error;
mod log_discovery;
mod log_reader;
mod logging;
mod models;
mod parser;
mod report;
mod stats;

use analyzer::RunOutcome;
use config::Config;

/// Build a per-URL request time report from the newest nginx UI access log
#[derive(Parser, Debug)]
#[command(name = "log_analyzer", version)]
struct Cli {
    /// Path to a TOML config file. Built-in defaults are used when omitted.
    #[arg(long = "config", value_name = "PATH")]
    config_path: Option<PathBuf>,
}

fn run(cli: &Cli) -> Result<RunOutcome> {
    let config = Config::load(cli.config_path.as_deref()).context("Failed to load configuration")?;
    logging::init_logging(config.log_file.as_deref())?;

    info!(
        "Log dir: {}, report dir: {}, report size: {}, error threshold: {}",
        config.log_dir.display(),
        config.report_dir.display(),
        config.report_size,
        config.error_threshold
    );

    let outcome = analyzer::run(&config)?;
    Ok(outcome)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(RunOutcome::Generated { path, lines, urls }) => {
            info!("Analyzed {} lines, {} URLs, report: {}", lines, urls, path.display());
            ExitCode::SUCCESS
        }
        Ok(RunOutcome::ReportAlreadyExists(_)) | Ok(RunOutcome::NoLogFound) => ExitCode::SUCCESS,
        Err(e) => {
            // The subscriber may not be installed if config loading failed
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

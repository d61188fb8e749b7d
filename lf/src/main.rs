//! lintfleet - concurrent repository linter
//!
//! CLI entry point: loads configuration, then scans every repository while
//! painting live progress to the terminal.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{CommandFactory, FromArgMatches};
use colored::Colorize;
use eyre::{Context, Result};
use tracing::{debug, info};

use lintfleet::cli::{Cli, generate_after_help};
use lintfleet::config::{Config, LintConfig};
use lintfleet::coordinator::Coordinator;
use lintfleet::job::CommandJob;
use lintfleet::persist::JsonResultWriter;
use lintfleet::render::{CrosstermTerminal, TerminalEvents};
use lintfleet::scan::Scanner;

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("lintfleet")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Determine log level with priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    // stdout belongs to the painter, so logs only go to the file
    let log_file = fs::File::create(log_dir.join("lintfleet.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Build command with dynamic after_help that shows tool checks
    let linter = Config::peek(None)
        .map(|config| config.lint.command)
        .unwrap_or_else(|| LintConfig::default().command);
    let cmd = Cli::command().after_help(generate_after_help(&linter));

    let cli = Cli::from_arg_matches(&cmd.get_matches())?;

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());

    // Setup logging with priority: CLI > config > INFO default
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let mut config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    cli.apply_overrides(&mut config);
    config.validate().context("Invalid configuration")?;

    info!(
        repositories = config.repositories.len(),
        concurrency = config.concurrency,
        "lintfleet loaded config"
    );
    run_scan(config).await
}

async fn run_scan(config: Config) -> Result<()> {
    debug!("run_scan: called");
    let job = CommandJob::new(config.lint.clone(), config.clone.clone()).context("Invalid lint configuration")?;
    let writer = JsonResultWriter::new(&config.results_dir);

    let coordinator = Coordinator::new(config.coordinator_config(), CrosstermTerminal::stdout());
    let handle = coordinator.handle();
    let events = TerminalEvents::spawn(coordinator.control_sender(), Duration::from_millis(100));
    let render = tokio::spawn(coordinator.run());

    let scanner = Scanner::new(config.pool_config(), Arc::new(job), Arc::new(writer));
    let (report, summary) = scanner
        .scan_and_render(config.repositories.clone(), handle, render)
        .await?;
    debug!(events_stopped = events.is_finished(), "run_scan: render finished");

    let findings: usize = report
        .outcomes
        .iter()
        .filter_map(|o| o.result.as_ref().ok().copied().flatten())
        .sum();
    let failed = report
        .outcomes
        .iter()
        .filter(|o| !matches!(o.result, Ok(Some(_))))
        .count();
    info!(
        scanned = summary.scanned(),
        findings,
        failed,
        ticks = summary.metrics.ticks,
        "Scan finished"
    );

    let count = if findings == 0 {
        findings.to_string().green()
    } else {
        findings.to_string().red()
    };
    println!(
        "{} {} findings written to {}",
        "\u{2713}".green(),
        count,
        config.results_dir.display().to_string().cyan()
    );
    Ok(())
}

//! CLI definition and startup checks

use clap::Parser;
use std::path::PathBuf;
use tracing::debug;

use crate::config::Config;

/// lintfleet - lint many repositories at once with live terminal progress
#[derive(Debug, Parser)]
#[command(
    name = "lf",
    about = "Scan many repositories with a linter under a concurrency cap",
    version = env!("GIT_DESCRIBE"),
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Max repositories scanned at once
    #[arg(short = 'j', long)]
    pub concurrency: Option<usize>,

    /// Paint interval in milliseconds
    #[arg(long = "tick-ms", value_name = "MS")]
    pub tick_ms: Option<u64>,

    /// Directory for per-repository result files
    #[arg(long = "results-dir", value_name = "DIR")]
    pub results_dir: Option<PathBuf>,

    /// Repositories to scan (local paths or git URLs); replaces the configured list
    #[arg(value_name = "REPOSITORIES")]
    pub repositories: Vec<String>,
}

impl Cli {
    /// Apply command-line values on top of the loaded config
    pub fn apply_overrides(&self, config: &mut Config) {
        debug!("Cli::apply_overrides: called");
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }
        if let Some(tick_ms) = self.tick_ms {
            config.render.tick_ms = tick_ms;
        }
        if let Some(dir) = &self.results_dir {
            config.results_dir = dir.clone();
        }
        if let Some(level) = &self.log_level {
            config.log_level = Some(level.clone());
        }
        if !self.repositories.is_empty() {
            debug!(count = self.repositories.len(), "Cli::apply_overrides: replacing repositories");
            config.repositories = self.repositories.clone();
        }
    }
}

/// Availability of an external tool
pub struct ToolCheck {
    pub name: String,
    pub available: bool,
    pub version: Option<String>,
}

impl ToolCheck {
    /// Check if a tool is available and get its version
    pub fn check(name: &str, version_args: &[&str]) -> Self {
        debug!(name, ?version_args, "ToolCheck::check: called");
        let result = std::process::Command::new(name).args(version_args).output();

        match result {
            Ok(output) if output.status.success() => {
                debug!(name, "ToolCheck::check: tool available");
                let version_str = String::from_utf8_lossy(&output.stdout);
                Self {
                    name: name.to_string(),
                    available: true,
                    version: Some(parse_version(&version_str)),
                }
            }
            _ => {
                debug!(name, "ToolCheck::check: tool not available");
                Self {
                    name: name.to_string(),
                    available: false,
                    version: None,
                }
            }
        }
    }
}

/// Parse version from command output (extracts first version-like string)
fn parse_version(output: &str) -> String {
    for word in output.split_whitespace() {
        let word = word.trim_start_matches('v');
        if word.chars().next().is_some_and(|c| c.is_ascii_digit()) {
            let version: String = word.chars().take_while(|c| c.is_ascii_digit() || *c == '.').collect();
            if !version.is_empty() {
                return version;
            }
        }
    }
    "unknown".to_string()
}

/// Check git and the linter
pub fn check_required_tools(linter: &str) -> Vec<ToolCheck> {
    debug!(%linter, "check_required_tools: called");
    vec![
        ToolCheck::check("git", &["--version"]),
        ToolCheck::check(linter, &["--version"]),
    ]
}

pub fn get_log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("lintfleet")
        .join("logs")
        .join("lintfleet.log")
}

/// Help footer listing tool availability and the log location
pub fn generate_after_help(linter: &str) -> String {
    debug!("generate_after_help: called");
    let tools = check_required_tools(linter);
    let log_path = get_log_path();

    let mut help = String::new();

    help.push_str("Required Tools:\n");
    for tool in &tools {
        let icon = if tool.available { "\u{2705}" } else { "\u{274C}" };
        let version = tool.version.as_deref().unwrap_or("not found");
        help.push_str(&format!("  {} {:<10} {}\n", icon, tool.name, version));
    }

    help.push('\n');
    help.push_str(&format!("Logs are written to: {}\n", log_path.display()));
    help
}

//! lintfleet configuration types and loading

use std::fs;
use std::path::{Path, PathBuf};

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::coordinator::CoordinatorConfig;
use crate::pool::PoolConfig;

/// Configuration values that cannot be used
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("concurrency must be at least 1 (got {0})")]
    InvalidConcurrency(usize),

    #[error("render tick interval must be at least 1ms (got {0})")]
    InvalidTickInterval(u64),

    #[error("channel buffer must be at least 1 (got {0})")]
    InvalidChannelBuffer(usize),

    #[error("no repositories to scan; list them in the config file or pass them as arguments")]
    NoRepositories,
}

/// Main lintfleet configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Max repositories scanned at once
    pub concurrency: usize,

    /// Log level (trace, debug, info, warn, error)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    /// Terminal rendering
    pub render: RenderConfig,

    /// Coordinator inbox capacity
    #[serde(rename = "channel-buffer")]
    pub channel_buffer: usize,

    /// Repositories to scan: local paths or git URLs
    pub repositories: Vec<String>,

    /// Where per-repository findings are written
    #[serde(rename = "results-dir")]
    pub results_dir: PathBuf,

    pub lint: LintConfig,

    pub clone: CloneConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            concurrency: 5,
            log_level: None,
            render: RenderConfig::default(),
            channel_buffer: 1000,
            repositories: Vec::new(),
            results_dir: PathBuf::from("results"),
            lint: LintConfig::default(),
            clone: CloneConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration before use
    ///
    /// Call this after CLI overrides are applied, so an empty config file with
    /// repositories on the command line is accepted.
    pub fn validate(&self) -> Result<(), ConfigError> {
        debug!("Config::validate: called");
        if self.concurrency == 0 {
            return Err(ConfigError::InvalidConcurrency(self.concurrency));
        }
        if self.render.tick_ms == 0 {
            return Err(ConfigError::InvalidTickInterval(self.render.tick_ms));
        }
        if self.channel_buffer == 0 {
            return Err(ConfigError::InvalidChannelBuffer(self.channel_buffer));
        }
        if self.repositories.is_empty() {
            return Err(ConfigError::NoRepositories);
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        for candidate in Self::candidates() {
            if candidate.exists() {
                match Self::load_from_file(&candidate) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", candidate.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read the config that `load` would pick, without logging
    ///
    /// Used before logging is set up. Errors are swallowed; the full load
    /// reports them once logging works.
    pub fn peek(config_path: Option<&PathBuf>) -> Option<Self> {
        let path = match config_path {
            Some(path) => path.clone(),
            None => Self::candidates().into_iter().find(|p| p.exists())?,
        };
        let content = fs::read_to_string(path).ok()?;
        serde_yaml::from_str(&content).ok()
    }

    /// Peek at the configured log level
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        Self::peek(config_path)?.log_level
    }

    /// Project-local file, then the user config dir
    fn candidates() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(".lintfleet.yml")];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("lintfleet").join("lintfleet.yml"));
        }
        paths
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig::new(self.concurrency)
    }

    pub fn coordinator_config(&self) -> CoordinatorConfig {
        CoordinatorConfig {
            tick_ms: self.render.tick_ms,
            channel_buffer: self.channel_buffer,
        }
    }
}

/// Terminal rendering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Paint interval in milliseconds
    #[serde(rename = "tick-ms")]
    pub tick_ms: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self { tick_ms: 200 }
    }
}

/// Linter invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LintConfig {
    /// Program run once per file
    pub command: String,

    /// Arguments placed before the file path
    pub args: Vec<String>,

    /// Rule under test; findings for other rules are dropped, and crashes are reported under it
    pub rule: Option<String>,

    /// Glob patterns of files to lint, relative to the repository root
    pub include: Vec<String>,

    /// Per-file timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for LintConfig {
    fn default() -> Self {
        Self {
            command: "eslint".to_string(),
            args: vec!["--format".to_string(), "unix".to_string()],
            rule: None,
            include: vec!["**/*.js".to_string(), "**/*.ts".to_string()],
            timeout_ms: 60_000,
        }
    }
}

/// Repository cloning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CloneConfig {
    /// `git clone --depth`
    pub depth: u32,

    /// Parent directory for temporary clones
    #[serde(rename = "work-dir")]
    pub work_dir: PathBuf,
}

impl Default for CloneConfig {
    fn default() -> Self {
        Self {
            depth: 1,
            work_dir: std::env::temp_dir().join("lintfleet").join("clones"),
        }
    }
}

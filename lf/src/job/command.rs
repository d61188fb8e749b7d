//! CommandJob - clone, read and lint one repository with external commands

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use eyre::Result;
use glob::{MatchOptions, Pattern};
use tempfile::TempDir;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::{Finding, Job, JobEvent};
use crate::config::{CloneConfig, LintConfig};
use crate::coordinator::EventSink;
use crate::persist::slug;

/// Failures inside a single repository scan
#[derive(Debug, Error)]
pub enum JobError {
    #[error("invalid include pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("failed to prepare clone directory {path}: {source}")]
    WorkDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("git clone of {key} failed: {detail}")]
    Clone { key: String, detail: String },

    #[error("failed to read {path}: {detail}")]
    Read { path: PathBuf, detail: String },

    #[error("linter failed on {path}: {detail}")]
    Lint { path: String, detail: String },
}

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Scans a repository by shelling out to git and the configured linter
///
/// Local directories are linted in place; anything else is treated as a git
/// URL and shallow-cloned into a temporary directory under the work dir,
/// which is removed when the job ends.
pub struct CommandJob {
    lint: LintConfig,
    clone: CloneConfig,
    include: Vec<Pattern>,
}

impl CommandJob {
    pub fn new(lint: LintConfig, clone: CloneConfig) -> Result<Self, JobError> {
        debug!(command = %lint.command, "CommandJob::new: called");
        let include = lint
            .include
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|source| JobError::Pattern {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { lint, clone, include })
    }

    /// Rule reported when the linter crashes
    fn rule_id(&self) -> String {
        self.lint.rule.clone().unwrap_or_else(|| self.lint.command.clone())
    }

    async fn clone_repository(&self, key: &str) -> Result<TempDir, JobError> {
        debug!(%key, "CommandJob::clone_repository: called");
        let work_dir = &self.clone.work_dir;
        tokio::fs::create_dir_all(work_dir)
            .await
            .map_err(|source| JobError::WorkDir {
                path: work_dir.clone(),
                source,
            })?;
        let checkout = tempfile::Builder::new()
            .prefix(&format!("{}-", slug(key)))
            .tempdir_in(work_dir)
            .map_err(|source| JobError::WorkDir {
                path: work_dir.clone(),
                source,
            })?;

        let output = Command::new("git")
            .arg("clone")
            .arg("--quiet")
            .arg("--depth")
            .arg(self.clone.depth.max(1).to_string())
            .arg(key)
            .arg(checkout.path())
            .env("GIT_TERMINAL_PROMPT", "0")
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| JobError::Clone {
                key: key.to_string(),
                detail: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(JobError::Clone {
                key: key.to_string(),
                detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        info!(%key, path = %checkout.path().display(), "Cloned repository");
        Ok(checkout)
    }

    async fn read_files(&self, root: &Path) -> Result<Vec<PathBuf>, JobError> {
        debug!(root = %root.display(), "CommandJob::read_files: called");
        let root = root.to_path_buf();
        let include = self.include.clone();
        let walk_root = root.clone();
        tokio::task::spawn_blocking(move || collect_files(&walk_root, &include))
            .await
            .map_err(|e| JobError::Read {
                path: root,
                detail: e.to_string(),
            })?
    }

    async fn lint_file(&self, root: &Path, file: &Path) -> Result<Vec<Finding>, JobError> {
        let path = file.to_string_lossy().to_string();
        debug!(%path, "CommandJob::lint_file: called");
        let timeout_ms = self.lint.timeout_ms;

        let run = Command::new(&self.lint.command)
            .args(&self.lint.args)
            .arg(file)
            .current_dir(root)
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(Duration::from_millis(timeout_ms), run).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(JobError::Lint {
                    path,
                    detail: format!("failed to run {}: {}", self.lint.command, e),
                });
            }
            Err(_) => {
                return Err(JobError::Lint {
                    path,
                    detail: format!("timed out after {}ms", timeout_ms),
                });
            }
        };

        // eslint: 0 = clean, 1 = findings, anything else = crash
        match output.status.code() {
            Some(0) | Some(1) => Ok(String::from_utf8_lossy(&output.stdout)
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .filter(|line| self.lint.rule.as_deref().is_none_or(|rule| reports_rule(line, rule)))
                .map(|line| Finding {
                    path: path.clone(),
                    message: line.to_string(),
                })
                .collect()),
            code => Err(JobError::Lint {
                path,
                detail: format!(
                    "exit status {}: {}",
                    code.map_or_else(|| "signal".to_string(), |c| c.to_string()),
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            }),
        }
    }
}

#[async_trait]
impl Job for CommandJob {
    async fn run(&self, key: &str, sink: &EventSink) -> Result<Vec<Finding>> {
        debug!(%key, "CommandJob::run: called");
        sink.emit(JobEvent::Start).await;

        // Held until the end of the scan; dropping it removes the clone
        let mut checkout: Option<TempDir> = None;
        let local = Path::new(key);
        let root = if local.is_dir() {
            local.to_path_buf()
        } else {
            sink.emit(JobEvent::Clone).await;
            match self.clone_repository(key).await {
                Ok(dir) => checkout.insert(dir).path().to_path_buf(),
                Err(e) => {
                    warn!(%key, error = %e, "Clone failed");
                    sink.emit(JobEvent::CloneFailure).await;
                    return Ok(Vec::new());
                }
            }
        };

        sink.emit(JobEvent::Read).await;
        let files = match self.read_files(&root).await {
            Ok(files) => files,
            Err(e) => {
                warn!(%key, error = %e, "Read failed");
                sink.emit(JobEvent::ReadFailure).await;
                return Ok(Vec::new());
            }
        };

        sink.emit(JobEvent::LintStart { file_count: files.len() }).await;
        let mut findings = Vec::new();
        for (i, file) in files.iter().enumerate() {
            match self.lint_file(&root, file).await {
                Ok(mut found) => findings.append(&mut found),
                Err(e) => {
                    warn!(%key, error = %e, "Linter crashed");
                    sink.emit(JobEvent::LinterCrash { rule_id: self.rule_id() }).await;
                }
            }
            sink.emit(JobEvent::FileLintEnd { index: i + 1 }).await;
        }

        info!(%key, files = files.len(), findings = findings.len(), "Repository linted");
        drop(checkout);
        Ok(findings)
    }
}

/// Whether a unix-format line (`file:line:col: message [Error/rule-id]`)
/// reports `rule`
fn reports_rule(line: &str, rule: &str) -> bool {
    let Some(tag) = line.strip_suffix(']').and_then(|rest| rest.rsplit_once('[')).map(|(_, tag)| tag) else {
        return false;
    };
    tag.rsplit('/').next() == Some(rule)
}

/// Files under `root` matching any of `include`, relative and sorted
///
/// An empty pattern list matches every file. `.git` is never entered.
fn collect_files(root: &Path, include: &[Pattern]) -> Result<Vec<PathBuf>, JobError> {
    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.file_name() != ".git");

    for entry in walker {
        let entry = entry.map_err(|e| JobError::Read {
            path: root.to_path_buf(),
            detail: e.to_string(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        if include.is_empty() || include.iter().any(|p| p.matches_path_with(relative, MATCH_OPTIONS)) {
            files.push(relative.to_path_buf());
        }
    }
    Ok(files)
}

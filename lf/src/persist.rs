//! Result persistence

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::job::Finding;

/// Failures while writing a result file
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to create results directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize results: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Destination for a repository's findings
#[async_trait]
pub trait ResultWriter: Send + Sync {
    /// Store `findings` for `repository`, returning where they went
    async fn write(&self, repository: &str, findings: &[Finding]) -> Result<PathBuf, PersistError>;
}

/// On-disk shape of one result file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultFile {
    pub repository: String,
    #[serde(rename = "scanned-at")]
    pub scanned_at: DateTime<Utc>,
    pub findings: Vec<Finding>,
}

/// Writes `<dir>/<slug>.json` per repository
#[derive(Debug, Clone)]
pub struct JsonResultWriter {
    dir: PathBuf,
}

impl JsonResultWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, repository: &str) -> PathBuf {
        self.dir.join(format!("{}.json", slug(repository)))
    }
}

#[async_trait]
impl ResultWriter for JsonResultWriter {
    async fn write(&self, repository: &str, findings: &[Finding]) -> Result<PathBuf, PersistError> {
        debug!(%repository, findings = findings.len(), "JsonResultWriter::write: called");
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| PersistError::CreateDir {
                path: self.dir.clone(),
                source,
            })?;

        let file = ResultFile {
            repository: repository.to_string(),
            scanned_at: Utc::now(),
            findings: findings.to_vec(),
        };
        let json = serde_json::to_string_pretty(&file)?;

        let path = self.path_for(repository);
        tokio::fs::write(&path, json)
            .await
            .map_err(|source| PersistError::Write {
                path: path.clone(),
                source,
            })?;

        info!(%repository, path = %path.display(), "Wrote results");
        Ok(path)
    }
}

/// File-name-safe form of a repository key
pub fn slug(repository: &str) -> String {
    repository
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

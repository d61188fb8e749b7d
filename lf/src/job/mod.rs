//! Job contract
//!
//! A job scans one repository. It reports progress only through
//! [`JobEvent`]s pushed into its [`EventSink`], and resolves with the
//! findings it produced. Jobs never touch the status board or the terminal.

mod command;

pub use command::{CommandJob, JobError};

use async_trait::async_trait;
use eyre::Result;
use serde::{Deserialize, Serialize};

use crate::coordinator::EventSink;

/// Progress events a job may emit, in phase order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum JobEvent {
    /// Job picked up by a pool slot
    Start,
    /// Cloning the repository
    Clone,
    /// Reading the repository's files
    Read,
    CloneFailure,
    ReadFailure,
    /// Linting is about to run over `file_count` files
    LintStart { file_count: usize },
    /// File number `index` (1-based) has been linted
    FileLintEnd { index: usize },
    /// The linter crashed while applying `rule_id`
    LinterCrash { rule_id: String },
}

/// A single linter report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// File path relative to the repository root
    pub path: String,
    pub message: String,
}

/// The work done for one repository key
#[async_trait]
pub trait Job: Send + Sync {
    /// Scan `key`, emitting progress into `sink`
    ///
    /// Recoverable problems (clone or read failure, a crashing rule) are
    /// reported as events and still resolve `Ok`, possibly with no findings.
    async fn run(&self, key: &str, sink: &EventSink) -> Result<Vec<Finding>>;
}

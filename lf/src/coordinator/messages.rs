//! Message types for the Coordinator

use serde::{Deserialize, Serialize};

use crate::job::JobEvent;
use crate::status::StatusBoard;

/// Requests to the Coordinator task, sent by jobs and the scanner
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoordRequest {
    /// Progress event from a running job
    Job { key: String, event: JobEvent },

    /// Job resolved with `result_count` findings
    LintEnd { key: String, result_count: usize },

    /// Findings for `key` could not be written
    WriteFailure { key: String },

    /// Job returned an error or panicked
    JobFailed { key: String, reason: String },

    /// Pool drained; append the summary and stop after one more paint
    AllScanned,
}

/// Out-of-band messages, polled ahead of ticks and requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMessage {
    /// Terminal was resized to `cols` x `rows`
    Resize { cols: u16, rows: u16 },
}

/// Coordinator metrics for observability
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinatorMetrics {
    #[serde(rename = "messages-received")]
    pub messages_received: u64,
    pub ticks: u64,
    pub resizes: u64,
    #[serde(rename = "ops-painted")]
    pub ops_painted: u64,
}

/// What the Coordinator hands back once it stops
#[derive(Debug)]
pub struct ScanSummary {
    /// Final state, including the closing summary message
    pub board: StatusBoard,
    pub metrics: CoordinatorMetrics,
}

impl ScanSummary {
    pub fn scanned(&self) -> usize {
        self.board.scanned()
    }
}

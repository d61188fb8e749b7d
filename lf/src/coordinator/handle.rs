//! CoordinatorHandle - client interface for the scanner and jobs

use eyre::{Result, eyre};
use tokio::sync::mpsc;
use tracing::debug;

use super::messages::CoordRequest;
use crate::job::JobEvent;

/// Handle for talking to the Coordinator
///
/// Cloneable; every clone keeps the Coordinator's inbox open.
#[derive(Debug, Clone)]
pub struct CoordinatorHandle {
    tx: mpsc::Sender<CoordRequest>,
}

impl CoordinatorHandle {
    pub fn new(tx: mpsc::Sender<CoordRequest>) -> Self {
        debug!("CoordinatorHandle::new: called");
        Self { tx }
    }

    /// Event sink bound to one job key
    pub fn sink_for(&self, key: &str) -> EventSink {
        debug!(%key, "CoordinatorHandle::sink_for: called");
        EventSink {
            tx: self.tx.clone(),
            key: key.to_string(),
        }
    }

    /// Tell the Coordinator the pool has drained
    pub async fn all_scanned(&self) -> Result<()> {
        debug!("CoordinatorHandle::all_scanned: called");
        self.tx
            .send(CoordRequest::AllScanned)
            .await
            .map_err(|_| eyre!("Coordinator channel closed"))?;
        Ok(())
    }
}

/// One-way event channel for a single job
///
/// Sends are fire-and-forget: once the Coordinator has stopped, events are
/// dropped and the job carries on.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::Sender<CoordRequest>,
    key: String,
}

impl EventSink {
    pub fn key(&self) -> &str {
        &self.key
    }

    /// True once the Coordinator has stopped and nothing will be shown
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Report job progress
    pub async fn emit(&self, event: JobEvent) {
        debug!(key = %self.key, ?event, "EventSink::emit: called");
        self.send(CoordRequest::Job {
            key: self.key.clone(),
            event,
        })
        .await;
    }

    /// Report that the job resolved with `result_count` findings
    pub async fn lint_end(&self, result_count: usize) {
        debug!(key = %self.key, result_count, "EventSink::lint_end: called");
        self.send(CoordRequest::LintEnd {
            key: self.key.clone(),
            result_count,
        })
        .await;
    }

    pub async fn write_failure(&self) {
        debug!(key = %self.key, "EventSink::write_failure: called");
        self.send(CoordRequest::WriteFailure { key: self.key.clone() }).await;
    }

    /// Report that the job failed outright
    pub async fn job_failed(&self, reason: &str) {
        debug!(key = %self.key, %reason, "EventSink::job_failed: called");
        self.send(CoordRequest::JobFailed {
            key: self.key.clone(),
            reason: reason.to_string(),
        })
        .await;
    }

    async fn send(&self, req: CoordRequest) {
        if self.tx.send(req).await.is_err() {
            debug!(key = %self.key, "EventSink: coordinator gone, dropping request");
        }
    }
}

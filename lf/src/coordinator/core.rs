//! Main Coordinator task implementation

use eyre::{Context, Result};
use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::config::CoordinatorConfig;
use super::handle::CoordinatorHandle;
use super::messages::{ControlMessage, CoordRequest, CoordinatorMetrics, ScanSummary};
use crate::render::{Painter, Terminal};
use crate::status::StatusBoard;

/// The Coordinator owns all display state and the painter
///
/// Job requests, resize notifications and paint ticks are handled one at a
/// time in a single task, so a frame never sees a half-applied event.
pub struct Coordinator<T: Terminal> {
    config: CoordinatorConfig,
    tx: mpsc::Sender<CoordRequest>,
    rx: mpsc::Receiver<CoordRequest>,
    control_tx: mpsc::UnboundedSender<ControlMessage>,
    control_rx: mpsc::UnboundedReceiver<ControlMessage>,
    painter: Painter<T>,
}

impl<T: Terminal> Coordinator<T> {
    /// Create a new Coordinator painting onto `terminal`
    pub fn new(config: CoordinatorConfig, terminal: T) -> Self {
        debug!(?config, "Coordinator::new: called");
        let (tx, rx) = mpsc::channel(config.channel_buffer.max(1));
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        Self {
            config,
            tx,
            rx,
            control_tx,
            control_rx,
            painter: Painter::new(terminal),
        }
    }

    pub fn handle(&self) -> CoordinatorHandle {
        CoordinatorHandle::new(self.tx.clone())
    }

    /// Sender for resize notifications
    pub fn control_sender(&self) -> mpsc::UnboundedSender<ControlMessage> {
        self.control_tx.clone()
    }

    /// Run the Coordinator task
    ///
    /// Consumes the Coordinator and runs until the scan is reported complete
    /// (or every handle is dropped) and one final frame has been painted.
    /// Terminal errors abort the run.
    pub async fn run(self) -> Result<ScanSummary> {
        let Self {
            config,
            tx,
            mut rx,
            control_tx,
            mut control_rx,
            mut painter,
        } = self;
        // Only handles keep the inbox open from here on
        drop(tx);
        drop(control_tx);

        let mut board = StatusBoard::new();
        let mut metrics = CoordinatorMetrics::default();
        let mut finishing = false;

        painter.start().context("Failed to prepare terminal")?;
        let mut ticker = time::interval(config.tick());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(tick_ms = config.tick_ms, "Coordinator started");

        loop {
            tokio::select! {
                biased;

                Some(control) = control_rx.recv() => match control {
                    ControlMessage::Resize { cols, rows } => {
                        info!(cols, rows, "Terminal resized, repainting");
                        metrics.resizes += 1;
                        painter.reset()?;
                        ticker.reset();
                    }
                },

                _ = ticker.tick() => {
                    metrics.ticks += 1;
                    metrics.ops_painted += painter.paint(&board)? as u64;
                    if finishing {
                        debug!("Coordinator: final frame painted");
                        break;
                    }
                }

                req = rx.recv(), if !finishing => match req {
                    Some(req) => {
                        metrics.messages_received += 1;
                        finishing = apply_request(&mut board, req);
                    }
                    None => {
                        warn!("Coordinator inbox closed before the scan was reported complete");
                        board.on_all_scanned();
                        finishing = true;
                    }
                },
            }
        }

        painter.finish()?;
        info!(
            scanned = board.scanned(),
            ticks = metrics.ticks,
            ops = metrics.ops_painted,
            "Coordinator stopped"
        );
        Ok(ScanSummary { board, metrics })
    }
}

/// Apply one request to the board; returns true once the scan is complete
fn apply_request(board: &mut StatusBoard, req: CoordRequest) -> bool {
    match req {
        CoordRequest::Job { key, event } => board.apply(&key, &event),
        CoordRequest::LintEnd { key, result_count } => board.on_lint_end(&key, result_count),
        CoordRequest::WriteFailure { key } => board.on_write_failure(&key),
        CoordRequest::JobFailed { key, reason } => board.on_job_failure(&key, &reason),
        CoordRequest::AllScanned => {
            board.on_all_scanned();
            return true;
        }
    }
    false
}

//! Terminal event forwarding
//!
//! Polls crossterm on a plain thread and forwards resizes to the coordinator
//! as control messages.

use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossterm::event;
use tokio::sync::mpsc;
use tracing::debug;

use crate::coordinator::ControlMessage;

/// Background thread reading terminal events
pub struct TerminalEvents {
    handle: JoinHandle<()>,
}

impl TerminalEvents {
    /// Start polling with `poll` as the wait between checks
    ///
    /// The thread exits once the coordinator drops its control receiver.
    pub fn spawn(tx: mpsc::UnboundedSender<ControlMessage>, poll: Duration) -> Self {
        debug!(?poll, "TerminalEvents::spawn: called");
        let handle = thread::spawn(move || {
            debug!("TerminalEvents: polling thread started");
            loop {
                if tx.is_closed() {
                    debug!("TerminalEvents: control channel closed, exiting loop");
                    break;
                }
                match event::poll(poll) {
                    Ok(true) => {}
                    Ok(false) => continue,
                    Err(e) => {
                        debug!(error = %e, "TerminalEvents: poll failed, exiting loop");
                        break;
                    }
                }
                match event::read() {
                    Ok(event::Event::Resize(cols, rows)) => {
                        debug!(cols, rows, "TerminalEvents: resize event received");
                        if tx.send(ControlMessage::Resize { cols, rows }).is_err() {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        debug!(error = %e, "TerminalEvents: read failed, exiting loop");
                        break;
                    }
                }
            }
            debug!("TerminalEvents: polling thread exiting");
        });
        Self { handle }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

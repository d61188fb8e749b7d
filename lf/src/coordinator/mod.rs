//! Coordinator: the single owner of display state
//!
//! Jobs and the scanner talk to it through a [`CoordinatorHandle`] and
//! per-job [`EventSink`]s; the terminal event thread sends resizes on a
//! separate control channel.

mod config;
mod core;
mod handle;
mod messages;

pub use config::CoordinatorConfig;
pub use core::Coordinator;
pub use handle::{CoordinatorHandle, EventSink};
pub use messages::{ControlMessage, CoordRequest, CoordinatorMetrics, ScanSummary};

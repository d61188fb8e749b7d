//! Live scan status
//!
//! Holds the per-repository tasks and the append-only message log that the
//! renderer turns into frames. The [`StatusBoard`] is the only writer; it is
//! owned by the coordinator and fed one job event at a time.

mod board;
mod message_log;
mod registry;
pub mod templates;
mod tint;

pub use board::StatusBoard;
pub use message_log::{LogMessage, MessageLog};
pub use registry::{Phase, StatusRegistry, Task, TaskUpdate};
pub use tint::Tint;

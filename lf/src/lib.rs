//! lintfleet - Concurrent repository linter with live terminal progress
//!
//! lintfleet scans many repositories with an external linter, running at most
//! a fixed number of scans at once, and renders progress to the terminal by
//! writing only the cells that changed since the previous frame.
//!
//! # Modules
//!
//! - [`pool`] - Bounded worker pool, strict input order
//! - [`job`] - Job contract and the command-line job body
//! - [`coordinator`] - Single owner of display state, fed over channels
//! - [`status`] - Task registry and message log
//! - [`render`] - Frame composition, diffing and terminal painting
//! - [`scan`] - Ties the pool, jobs, persistence and coordinator together
//! - [`persist`] - Result files
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod cli;
pub mod config;
pub mod coordinator;
pub mod job;
pub mod persist;
pub mod pool;
pub mod render;
pub mod scan;
pub mod status;

// Re-export commonly used types
pub use config::{CloneConfig, Config, ConfigError, LintConfig, RenderConfig};
pub use coordinator::{
    ControlMessage, CoordRequest, Coordinator, CoordinatorConfig, CoordinatorHandle, CoordinatorMetrics, EventSink,
    ScanSummary,
};
pub use job::{CommandJob, Finding, Job, JobError, JobEvent};
pub use persist::{JsonResultWriter, PersistError, ResultFile, ResultWriter};
pub use pool::{JobOutcome, PoolConfig, PoolReport, PoolStats, WorkerPool};
pub use render::{CrosstermTerminal, DiffOp, Frame, MemoryTerminal, Painter, TermSize, Terminal, TerminalEvents};
pub use scan::Scanner;
pub use status::{LogMessage, MessageLog, Phase, StatusBoard, StatusRegistry, Task, Tint};

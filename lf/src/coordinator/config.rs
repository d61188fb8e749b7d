//! Coordinator configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Coordinator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Paint interval in milliseconds
    #[serde(rename = "tick-ms", default = "default_tick_ms")]
    pub tick_ms: u64,

    /// Channel buffer size for job requests
    #[serde(rename = "channel-buffer", default = "default_channel_buffer")]
    pub channel_buffer: usize,
}

fn default_tick_ms() -> u64 {
    debug!("default_tick_ms: called");
    200
}

fn default_channel_buffer() -> usize {
    debug!("default_channel_buffer: called");
    1000
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        debug!("CoordinatorConfig::default: called");
        Self {
            tick_ms: 200,
            channel_buffer: 1000,
        }
    }
}

impl CoordinatorConfig {
    /// Get the paint interval as a Duration
    pub fn tick(&self) -> Duration {
        debug!(tick_ms = %self.tick_ms, "CoordinatorConfig::tick: called");
        Duration::from_millis(self.tick_ms.max(1))
    }
}

//! Worker pool configuration

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Worker pool configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Max jobs running at once
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

fn default_concurrency() -> usize {
    debug!("default_concurrency: called");
    5
}

impl Default for PoolConfig {
    fn default() -> Self {
        debug!("PoolConfig::default: called");
        Self { concurrency: 5 }
    }
}

impl PoolConfig {
    pub fn new(concurrency: usize) -> Self {
        Self { concurrency }
    }
}

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings of the periodic synchronization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Delay between the end of one pass and the start of the next.
    pub interval_ms: u64,
    /// Consecutive failures after which failures are logged as errors
    /// instead of warnings.
    pub error_threshold: u32,
}

impl SyncConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval_ms: 10_000,
            error_threshold: 5,
        }
    }
}

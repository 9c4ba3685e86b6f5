use dal_sync::SyncConfig;
use serde::{Deserialize, Serialize};

use crate::error::{AccessError, AccessResult};

/// Settings of a local data-access stack.
///
/// ```toml
/// auto_synchronization = true
/// persist = true
///
/// [synchronization]
/// interval_ms = 10000
/// error_threshold = 5
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataAccessConfig {
    pub synchronization: SyncConfig,
    /// Start periodic synchronization as part of `initialize`.
    pub auto_synchronization: bool,
    /// When `false`, writes skip the durable log entirely.
    pub persist: bool,
}

impl DataAccessConfig {
    pub fn from_toml_str(s: &str) -> AccessResult<Self> {
        toml::from_str(s).map_err(|e| AccessError::Config(e.to_string()))
    }
}

impl Default for DataAccessConfig {
    fn default() -> Self {
        Self {
            synchronization: SyncConfig::default(),
            auto_synchronization: false,
            persist: true,
        }
    }
}

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How a [`RemoteDataAccess`](crate::RemoteDataAccess) waits for write
/// confirmations.
///
/// After a persist, the client waits `confirmation_defer_ms`, then asks the
/// node for the confirmation up to `1 + confirmation_max_retries` times,
/// `confirmation_retry_delay_ms` apart.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub confirmation_defer_ms: u64,
    pub confirmation_max_retries: u32,
    pub confirmation_retry_delay_ms: u64,
}

impl RemoteConfig {
    pub fn defer(&self) -> Duration {
        Duration::from_millis(self.confirmation_defer_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.confirmation_retry_delay_ms)
    }

    /// Total number of confirmation requests before giving up.
    pub fn attempts(&self) -> u32 {
        self.confirmation_max_retries.saturating_add(1)
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            confirmation_defer_ms: 3_000,
            confirmation_max_retries: 500,
            confirmation_retry_delay_ms: 3_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = RemoteConfig::default();
        assert_eq!(config.defer(), Duration::from_secs(3));
        assert_eq!(config.retry_delay(), Duration::from_secs(3));
        assert_eq!(config.attempts(), 501);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: RemoteConfig =
            serde_json::from_str(r#"{"confirmation_max_retries":2}"#).unwrap();
        assert_eq!(config.attempts(), 3);
        assert_eq!(config.confirmation_defer_ms, 3_000);
    }

    #[test]
    fn attempts_saturate() {
        let config = RemoteConfig {
            confirmation_max_retries: u32::MAX,
            ..RemoteConfig::default()
        };
        assert_eq!(config.attempts(), u32::MAX);
    }
}

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Seconds since the UNIX epoch.
pub type Timestamp = u64;

/// Current wall-clock time in seconds.
pub fn now_seconds() -> Timestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Optional inclusive time window used to filter reads.
///
/// A missing bound is open: `from: None` starts at the beginning of the log,
/// `to: None` has no upper limit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimestampBoundaries {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Timestamp>,
}

impl TimestampBoundaries {
    /// Both bounds set.
    pub fn between(from: Timestamp, to: Timestamp) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
        }
    }

    /// Only a lower bound.
    pub fn since(from: Timestamp) -> Self {
        Self {
            from: Some(from),
            to: None,
        }
    }

    /// Only an upper bound.
    pub fn until(to: Timestamp) -> Self {
        Self {
            from: None,
            to: Some(to),
        }
    }

    /// Returns `true` when neither bound is set.
    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    /// Returns `true` if `from <= timestamp <= to` for whichever bounds are set.
    pub fn contains(&self, timestamp: Timestamp) -> bool {
        self.from.map_or(true, |from| from <= timestamp)
            && self.to.map_or(true, |to| timestamp <= to)
    }
}

impl fmt::Display for TimestampBoundaries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.from, self.to) {
            (Some(from), Some(to)) => write!(f, "[{from}, {to}]"),
            (Some(from), None) => write!(f, "[{from}, +inf]"),
            (None, Some(to)) => write!(f, "[-inf, {to}]"),
            (None, None) => write!(f, "[-inf, +inf]"),
        }
    }
}

//! First-seen timestamps of storage locations.

use std::collections::HashMap;

use dal_types::{StorageLocation, Timestamp, TimestampBoundaries};

use crate::error::{IndexError, IndexResult};

/// Location -> timestamp, first write wins, plus the highest timestamp seen.
#[derive(Clone, Debug, Default)]
pub struct TimestampByLocationIndex {
    timestamps: HashMap<StorageLocation, Timestamp>,
    last_timestamp: Option<Timestamp>,
}

impl TimestampByLocationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `timestamp` for `location` unless one is already known.
    ///
    /// Returns `true` if the location was new. The running maximum advances
    /// either way.
    pub fn record(&mut self, location: &StorageLocation, timestamp: Timestamp) -> bool {
        let inserted = if self.timestamps.contains_key(location) {
            false
        } else {
            self.timestamps.insert(location.clone(), timestamp);
            true
        };
        if self.last_timestamp.map_or(true, |last| timestamp > last) {
            self.last_timestamp = Some(timestamp);
        }
        inserted
    }

    pub fn timestamp_of(&self, location: &StorageLocation) -> Option<Timestamp> {
        self.timestamps.get(location).copied()
    }

    /// Whether the location's timestamp falls inside `boundaries`.
    ///
    /// `None` boundaries always match, but the location must still be known.
    pub fn is_within_boundaries(
        &self,
        location: &StorageLocation,
        boundaries: Option<&TimestampBoundaries>,
    ) -> IndexResult<bool> {
        let timestamp = self
            .timestamp_of(location)
            .ok_or_else(|| IndexError::UnknownTimestamp(location.clone()))?;
        Ok(boundaries.map_or(true, |b| b.contains(timestamp)))
    }

    /// Highest timestamp recorded so far.
    pub fn last_timestamp(&self) -> Option<Timestamp> {
        self.last_timestamp
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

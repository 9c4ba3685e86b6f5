//! The combined index handle shared by synchronization and reads.
//!
//! [`TransactionIndex`] owns a [`LocationByTopicIndex`], a
//! [`TimestampByLocationIndex`] and an [`IgnoredLocationIndex`] behind one
//! `RwLock`, so a header is always visible in both lookup tables at once.
//! Methods take `&self`; share the index through an `Arc`.

use std::collections::BTreeMap;
use std::sync::RwLock;

use dal_block::BlockHeader;
use dal_types::{ChannelId, StorageLocation, Timestamp, TimestampBoundaries, Topic};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::IndexResult;
use crate::ignored::IgnoredLocationIndex;
use crate::location_by_topic::LocationByTopicIndex;
use crate::timestamp_by_location::TimestampByLocationIndex;

/// Sizes of the index, as reported in synchronization status.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexCounts {
    pub indexed: usize,
    pub ignored: usize,
    /// Distinct channel ids.
    pub channels: usize,
    /// Distinct topics, implicit hash topics included.
    pub topics: usize,
}

#[derive(Default)]
struct IndexState {
    by_topic: LocationByTopicIndex,
    by_location: TimestampByLocationIndex,
    ignored: IgnoredLocationIndex,
    indexed: Vec<StorageLocation>,
}

impl IndexState {
    fn within(
        &self,
        locations: Vec<StorageLocation>,
        boundaries: Option<&TimestampBoundaries>,
    ) -> IndexResult<Vec<StorageLocation>> {
        let mut kept = Vec::with_capacity(locations.len());
        for location in locations {
            if self.by_location.is_within_boundaries(&location, boundaries)? {
                kept.push(location);
            }
        }
        Ok(kept)
    }

    fn channels_within(
        &self,
        channel_ids: Vec<ChannelId>,
        boundaries: Option<&TimestampBoundaries>,
    ) -> IndexResult<Vec<ChannelId>> {
        if boundaries.map_or(true, TimestampBoundaries::is_unbounded) {
            return Ok(channel_ids);
        }
        let mut kept = Vec::with_capacity(channel_ids.len());
        for channel_id in channel_ids {
            let locations = self.by_topic.locations_for_channel(&channel_id);
            if !self.within(locations, boundaries)?.is_empty() {
                kept.push(channel_id);
            }
        }
        Ok(kept)
    }
}

/// Channel/topic and timestamp indices behind a single lock.
#[derive(Default)]
pub struct TransactionIndex {
    state: RwLock<IndexState>,
}

impl TransactionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    // ---------------------------------------------------------------
    // Mutation
    // ---------------------------------------------------------------

    /// Index the block header stored at `location`, first seen at `timestamp`.
    pub fn add_transaction(
        &self,
        location: &StorageLocation,
        header: &BlockHeader,
        timestamp: Timestamp,
    ) {
        let mut state = self.state.write().expect("lock poisoned");
        state.by_topic.record_block_header(location, header);
        if state.by_location.record(location, timestamp) {
            state.indexed.push(location.clone());
        }
        debug!(
            %location,
            timestamp,
            channels = header.channel_ids().len(),
            "block header indexed"
        );
    }

    /// Remember that `location` was skipped.
    pub fn add_ignored(&self, location: &StorageLocation, reason: impl Into<String>) {
        self.state
            .write()
            .expect("lock poisoned")
            .ignored
            .record(location, reason);
    }

    /// Atomically swap in the contents of `other`.
    pub fn replace_with(&self, other: TransactionIndex) {
        let fresh = other.state.into_inner().expect("lock poisoned");
        *self.state.write().expect("lock poisoned") = fresh;
    }

    // ---------------------------------------------------------------
    // Lookups
    // ---------------------------------------------------------------

    /// Locations holding transactions of `channel_id` within `boundaries`,
    /// in the order they were indexed.
    pub fn storage_locations(
        &self,
        channel_id: &ChannelId,
        boundaries: Option<&TimestampBoundaries>,
    ) -> IndexResult<Vec<StorageLocation>> {
        let state = self.state.read().expect("lock poisoned");
        let locations = state.by_topic.locations_for_channel(channel_id);
        state.within(locations, boundaries)
    }

    /// Channels indexed under `topic` having at least one location within
    /// `boundaries`.
    pub fn channel_ids_for_topic(
        &self,
        topic: &Topic,
        boundaries: Option<&TimestampBoundaries>,
    ) -> IndexResult<Vec<ChannelId>> {
        let state = self.state.read().expect("lock poisoned");
        let channels = state.by_topic.channel_ids_for_topic(topic);
        state.channels_within(channels, boundaries)
    }

    /// Like [`channel_ids_for_topic`](Self::channel_ids_for_topic) for the
    /// union of several topics.
    pub fn channel_ids_for_multiple_topics(
        &self,
        topics: &[Topic],
        boundaries: Option<&TimestampBoundaries>,
    ) -> IndexResult<Vec<ChannelId>> {
        let state = self.state.read().expect("lock poisoned");
        let channels = state.by_topic.channel_ids_for_topics(topics);
        state.channels_within(channels, boundaries)
    }

    pub fn timestamp_of(&self, location: &StorageLocation) -> Option<Timestamp> {
        self.state
            .read()
            .expect("lock poisoned")
            .by_location
            .timestamp_of(location)
    }

    /// Highest timestamp indexed so far.
    pub fn last_transaction_timestamp(&self) -> Option<Timestamp> {
        self.state
            .read()
            .expect("lock poisoned")
            .by_location
            .last_timestamp()
    }

    /// Every indexed location in first-seen order.
    pub fn indexed_locations(&self) -> Vec<StorageLocation> {
        self.state.read().expect("lock poisoned").indexed.clone()
    }

    pub fn ignored_reason(&self, location: &StorageLocation) -> Option<String> {
        self.state
            .read()
            .expect("lock poisoned")
            .ignored
            .reason_for(location)
            .map(str::to_string)
    }

    pub fn ignored_locations(&self) -> BTreeMap<StorageLocation, String> {
        self.state
            .read()
            .expect("lock poisoned")
            .ignored
            .ignored_locations()
            .clone()
    }

    pub fn counts(&self) -> IndexCounts {
        let state = self.state.read().expect("lock poisoned");
        IndexCounts {
            indexed: state.indexed.len(),
            ignored: state.ignored.len(),
            channels: state.by_topic.channel_count(),
            topics: state.by_topic.topic_count(),
        }
    }
}

impl std::fmt::Debug for TransactionIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts = self.counts();
        f.debug_struct("TransactionIndex")
            .field("indexed", &counts.indexed)
            .field("ignored", &counts.ignored)
            .field("last_timestamp", &self.last_transaction_timestamp())
            .finish()
    }
}

//! Optimistic store for writes the durable log has not confirmed yet.

use std::collections::BTreeMap;
use std::sync::RwLock;

use dal_types::{ChannelId, EntryMeta, StorageLocation, Topic, Transaction};
use tracing::{debug, warn};

/// A submitted, not-yet-confirmed write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingItem {
    pub transaction: Transaction,
    /// Provisional location returned by the append.
    pub location: StorageLocation,
    pub meta: EntryMeta,
    pub topics: Vec<Topic>,
}

/// Pending writes keyed by channel id.
///
/// Holds at most one item per channel: a second write to the same channel
/// before the first is observed as confirmed replaces it here, although both
/// are durably appended.
#[derive(Debug, Default)]
pub struct PendingStore {
    items: RwLock<BTreeMap<ChannelId, PendingItem>>,
}

impl PendingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `item` for `channel_id`, returning the item it replaced.
    pub fn add(&self, channel_id: &ChannelId, item: PendingItem) -> Option<PendingItem> {
        let location = item.location.clone();
        let previous = self
            .items
            .write()
            .expect("lock poisoned")
            .insert(channel_id.clone(), item);
        match &previous {
            Some(shadowed) => warn!(
                channel_id = %channel_id,
                shadowed = %shadowed.location,
                %location,
                "pending write replaced an unconfirmed one"
            ),
            None => debug!(channel_id = %channel_id, %location, "pending write registered"),
        }
        previous
    }

    pub fn get(&self, channel_id: &ChannelId) -> Option<PendingItem> {
        self.items
            .read()
            .expect("lock poisoned")
            .get(channel_id)
            .cloned()
    }

    pub fn remove(&self, channel_id: &ChannelId) -> Option<PendingItem> {
        self.items.write().expect("lock poisoned").remove(channel_id)
    }

    /// Remove the item for `channel_id` only if it is still the one stored at
    /// `location`. Returns `true` if something was removed.
    pub fn remove_if_at(&self, channel_id: &ChannelId, location: &StorageLocation) -> bool {
        let mut items = self.items.write().expect("lock poisoned");
        if items.get(channel_id).is_some_and(|item| &item.location == location) {
            items.remove(channel_id);
            true
        } else {
            false
        }
    }

    /// Items whose topics intersect `topics`, with their channel ids.
    pub fn find_by_topics(&self, topics: &[Topic]) -> Vec<(ChannelId, PendingItem)> {
        self.items
            .read()
            .expect("lock poisoned")
            .iter()
            .filter(|(_, item)| item.topics.iter().any(|topic| topics.contains(topic)))
            .map(|(channel_id, item)| (channel_id.clone(), item.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.items.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

//! Channel and topic lookup tables built from block headers.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use dal_block::BlockHeader;
use dal_types::{ChannelId, StorageLocation, Topic};

/// Maps channel ids to the locations that touched them, and topics to the
/// channel ids indexed under them.
///
/// Both tables are sets: recording the same header twice changes nothing.
/// Lookups return values in first-recorded order, and unknown keys yield an
/// empty list.
#[derive(Clone, Debug, Default)]
pub struct LocationByTopicIndex {
    locations_by_channel: HashMap<ChannelId, InsertionSet<StorageLocation>>,
    channels_by_topic: HashMap<Topic, InsertionSet<ChannelId>>,
}

impl LocationByTopicIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingest the header of the block stored at `location`.
    pub fn record_block_header(&mut self, location: &StorageLocation, header: &BlockHeader) {
        for channel_id in header.channel_ids().keys() {
            self.locations_by_channel
                .entry(channel_id.clone())
                .or_default()
                .insert(location.clone());
        }
        for (channel_id, topics) in header.topics() {
            for topic in topics {
                self.channels_by_topic
                    .entry(topic.clone())
                    .or_default()
                    .insert(channel_id.clone());
            }
        }
    }

    pub fn locations_for_channel(&self, channel_id: &ChannelId) -> Vec<StorageLocation> {
        self.locations_by_channel
            .get(channel_id)
            .map(InsertionSet::to_vec)
            .unwrap_or_default()
    }

    pub fn channel_ids_for_topic(&self, topic: &Topic) -> Vec<ChannelId> {
        self.channels_by_topic
            .get(topic)
            .map(InsertionSet::to_vec)
            .unwrap_or_default()
    }

    /// Union of [`channel_ids_for_topic`](Self::channel_ids_for_topic) over
    /// several topics.
    pub fn channel_ids_for_topics(&self, topics: &[Topic]) -> Vec<ChannelId> {
        let mut channels = InsertionSet::default();
        for topic in topics {
            if let Some(found) = self.channels_by_topic.get(topic) {
                channels.extend(found.iter().cloned());
            }
        }
        channels.into_vec()
    }

    /// Every location of every channel indexed under `topic`.
    pub fn locations_for_topic(&self, topic: &Topic) -> Vec<StorageLocation> {
        let mut locations = InsertionSet::default();
        for channel_id in self.channel_ids_for_topic(topic) {
            if let Some(found) = self.locations_by_channel.get(&channel_id) {
                locations.extend(found.iter().cloned());
            }
        }
        locations.into_vec()
    }

    /// Number of distinct channels seen.
    pub fn channel_count(&self) -> usize {
        self.locations_by_channel.len()
    }

    /// Number of distinct topics seen.
    pub fn topic_count(&self) -> usize {
        self.channels_by_topic.len()
    }
}

/// A set that remembers insertion order.
#[derive(Clone, Debug)]
struct InsertionSet<T> {
    order: Vec<T>,
    seen: HashSet<T>,
}

impl<T> Default for InsertionSet<T> {
    fn default() -> Self {
        Self {
            order: Vec::new(),
            seen: HashSet::new(),
        }
    }
}

impl<T: Clone + Eq + Hash> InsertionSet<T> {
    fn insert(&mut self, value: T) {
        if self.seen.insert(value.clone()) {
            self.order.push(value);
        }
    }

    fn extend(&mut self, values: impl IntoIterator<Item = T>) {
        for value in values {
            self.insert(value);
        }
    }

    fn iter(&self) -> impl Iterator<Item = &T> {
        self.order.iter()
    }

    fn to_vec(&self) -> Vec<T> {
        self.order.clone()
    }

    fn into_vec(self) -> Vec<T> {
        self.order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dal_block::Block;
    use dal_types::Transaction;

    fn header(entries: &[(&str, &str, &[&str])]) -> BlockHeader {
        let mut block = Block::empty();
        for (data, channel, topics) in entries {
            let topics: Vec<Topic> = topics.iter().map(|t| Topic::from(*t)).collect();
            block = block
                .push_transaction(Transaction::from_data(*data), &ChannelId::from(*channel), &topics)
                .unwrap();
        }
        block.into_header()
    }

    fn loc(s: &str) -> StorageLocation {
        StorageLocation::from(s)
    }

    #[test]
    fn unknown_keys_are_empty() {
        let index = LocationByTopicIndex::new();
        assert!(index.locations_for_channel(&ChannelId::from("c")).is_empty());
        assert!(index.channel_ids_for_topic(&Topic::from("t")).is_empty());
        assert!(index.locations_for_topic(&Topic::from("t")).is_empty());
        assert!(index.channel_ids_for_topics(&[Topic::from("t")]).is_empty());
    }

    #[test]
    fn records_channels_and_topics() {
        let mut index = LocationByTopicIndex::new();
        index.record_block_header(&loc("l1"), &header(&[("a", "c1", &["t1", "t2"])]));
        index.record_block_header(&loc("l2"), &header(&[("b", "c2", &["t1"])]));

        assert_eq!(index.locations_for_channel(&ChannelId::from("c1")), vec![loc("l1")]);
        assert_eq!(
            index.channel_ids_for_topic(&Topic::from("t1")),
            vec![ChannelId::from("c1"), ChannelId::from("c2")]
        );
        assert_eq!(
            index.channel_ids_for_topic(&Topic::from("t2")),
            vec![ChannelId::from("c1")]
        );
        assert_eq!(
            index.locations_for_topic(&Topic::from("t1")),
            vec![loc("l1"), loc("l2")]
        );
    }

    #[test]
    fn recording_twice_deduplicates() {
        let mut index = LocationByTopicIndex::new();
        let h = header(&[("a", "c1", &["t1"])]);
        index.record_block_header(&loc("l1"), &h);
        index.record_block_header(&loc("l1"), &h);

        assert_eq!(index.locations_for_channel(&ChannelId::from("c1")).len(), 1);
        assert_eq!(index.channel_ids_for_topic(&Topic::from("t1")).len(), 1);
    }

    #[test]
    fn one_block_with_two_channels() {
        let mut index = LocationByTopicIndex::new();
        index.record_block_header(
            &loc("l1"),
            &header(&[("a", "c1", &["shared"]), ("b", "c2", &["shared"])]),
        );
        assert_eq!(index.channel_count(), 2);
        assert_eq!(index.locations_for_topic(&Topic::from("shared")), vec![loc("l1")]);
    }

    #[test]
    fn channels_for_several_topics_is_a_union() {
        let mut index = LocationByTopicIndex::new();
        index.record_block_header(&loc("l1"), &header(&[("a", "c1", &["t1"])]));
        index.record_block_header(&loc("l2"), &header(&[("b", "c2", &["t2"])]));
        index.record_block_header(&loc("l3"), &header(&[("c", "c1", &["t2"])]));

        let channels = index.channel_ids_for_topics(&[
            Topic::from("t2"),
            Topic::from("t1"),
            Topic::from("missing"),
        ]);
        assert_eq!(channels, vec![ChannelId::from("c2"), ChannelId::from("c1")]);
    }

    #[test]
    fn transaction_hash_is_a_topic() {
        let transaction = Transaction::from_data("a");
        let hash_topic = hash_topic_of(&transaction);
        let mut index = LocationByTopicIndex::new();
        index.record_block_header(&loc("l1"), &header(&[("a", "c1", &[])]));
        assert_eq!(index.channel_ids_for_topic(&hash_topic), vec![ChannelId::from("c1")]);
        assert_eq!(index.topic_count(), 1);
    }

    fn hash_topic_of(transaction: &Transaction) -> Topic {
        let block = Block::empty()
            .push_transaction(transaction.clone(), &ChannelId::from("x"), &[])
            .unwrap();
        block.header().topics_for(&ChannelId::from("x"))[0].clone()
    }
}

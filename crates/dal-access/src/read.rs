//! Read composition: confirmed data from an indexer merged with pending writes.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use dal_types::{now_seconds, ChannelId, TimestampBoundaries, TimestampedTransaction, Topic};
use tracing::debug;

use crate::error::{AccessError, AccessResult};
use crate::pending::PendingStore;
use crate::result::{ChannelsByTopic, Pagination, PaginationMeta, TransactionsWithMeta};
use crate::traits::{DataRead, Indexer};

/// [`DataRead`] over an [`Indexer`], optionally surfacing pending writes.
///
/// A pending write is reported with state `Pending` and the current time as
/// its timestamp until the indexer knows its location. The first read that
/// finds it confirmed evicts it from the [`PendingStore`].
pub struct DataAccessRead<I> {
    indexer: Arc<I>,
    pending: Option<Arc<PendingStore>>,
}

impl<I: Indexer> DataAccessRead<I> {
    pub fn new(indexer: Arc<I>) -> Self {
        Self {
            indexer,
            pending: None,
        }
    }

    pub fn with_pending_store(indexer: Arc<I>, pending: Arc<PendingStore>) -> Self {
        Self {
            indexer,
            pending: Some(pending),
        }
    }

    pub fn indexer(&self) -> &Arc<I> {
        &self.indexer
    }

    pub fn pending_store(&self) -> Option<&Arc<PendingStore>> {
        self.pending.as_ref()
    }

    /// Append the pending write of `channel_id` to `group`, unless the write
    /// is already confirmed, in which case it is evicted instead.
    async fn merge_pending(
        &self,
        channel_id: &ChannelId,
        group: &mut TransactionsWithMeta,
    ) -> AccessResult<()> {
        let Some(store) = &self.pending else {
            return Ok(());
        };
        let Some(item) = store.get(channel_id) else {
            return Ok(());
        };

        let confirmed = group.storage_locations.contains(&item.location)
            || !self
                .indexer
                .transactions_by_storage_location(&item.location)
                .await?
                .is_empty();
        if confirmed {
            if store.remove_if_at(channel_id, &item.location) {
                debug!(
                    channel_id = %channel_id,
                    location = %item.location,
                    "pending write observed as confirmed, evicted"
                );
            }
            return Ok(());
        }

        group.push(
            TimestampedTransaction::pending(item.transaction, now_seconds()),
            item.location,
            item.meta,
        );
        Ok(())
    }
}

fn validate_topics(topics: &[Topic]) -> AccessResult<()> {
    if topics.is_empty() {
        return Err(AccessError::Validation("at least one topic is required".into()));
    }
    if topics.iter().any(Topic::is_empty) {
        return Err(AccessError::Validation("topics must not be empty".into()));
    }
    Ok(())
}

#[async_trait]
impl<I: Indexer> DataRead for DataAccessRead<I> {
    async fn initialize(&self) -> AccessResult<()> {
        self.indexer.initialize().await
    }

    async fn close(&self) -> AccessResult<()> {
        self.indexer.close().await
    }

    async fn transactions_by_channel_id(
        &self,
        channel_id: &ChannelId,
        boundaries: Option<TimestampBoundaries>,
    ) -> AccessResult<TransactionsWithMeta> {
        let mut result: TransactionsWithMeta = self
            .indexer
            .transactions_by_channel_id(channel_id, boundaries)
            .await?
            .into_iter()
            .collect();
        self.merge_pending(channel_id, &mut result).await?;
        Ok(result)
    }

    async fn channels_by_multiple_topics(
        &self,
        topics: &[Topic],
        boundaries: Option<TimestampBoundaries>,
        page: Option<usize>,
        page_size: Option<usize>,
    ) -> AccessResult<ChannelsByTopic> {
        validate_topics(topics)?;
        let pagination = Pagination::from_parts(page, page_size)?;

        let mut order: Vec<ChannelId> = Vec::new();
        let mut groups: HashMap<ChannelId, TransactionsWithMeta> = HashMap::new();
        for indexed in self.indexer.transactions_by_topics(topics, boundaries).await? {
            let group = groups.entry(indexed.channel_id.clone()).or_insert_with(|| {
                order.push(indexed.channel_id.clone());
                TransactionsWithMeta::default()
            });
            group.push(indexed.to_timestamped(), indexed.location, indexed.meta);
        }

        // Pending-only channels come after the confirmed ones. Their single
        // transaction is timestamped "now". They are resolved before paging so
        // a write that is already indexed is evicted rather than counted.
        let confirmed_count = order.len();
        if let Some(store) = &self.pending {
            let now = now_seconds();
            if boundaries.map_or(true, |b| b.contains(now)) {
                for (channel_id, _) in store.find_by_topics(topics) {
                    if groups.contains_key(&channel_id) {
                        continue;
                    }
                    let mut group = TransactionsWithMeta::default();
                    self.merge_pending(&channel_id, &mut group).await?;
                    if !group.is_empty() {
                        groups.insert(channel_id.clone(), group);
                        order.push(channel_id);
                    }
                }
            }
        }

        let total = order.len();
        let (range, pagination) = match pagination {
            Some(p) => {
                let range = p.range(total);
                let meta = PaginationMeta {
                    total,
                    page: p.page,
                    page_size: p.page_size,
                    has_more: range.end < total,
                };
                (range, Some(meta))
            }
            None => (0..total, None),
        };

        let mut channels = BTreeMap::new();
        for (position, channel_id) in order
            .into_iter()
            .enumerate()
            .skip(range.start)
            .take(range.len())
        {
            let mut group = groups.remove(&channel_id).unwrap_or_default();
            if position < confirmed_count {
                self.merge_pending(&channel_id, &mut group).await?;
            }
            channels.insert(channel_id, group);
        }

        Ok(ChannelsByTopic {
            channels,
            pagination,
        })
    }
}

impl<I> std::fmt::Debug for DataAccessRead<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataAccessRead")
            .field("pending", &self.pending.as_ref().map(|p| p.len()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pending::PendingItem;
    use crate::result::IndexedTransaction;
    use dal_types::{EntryMeta, StorageLocation, Transaction, TransactionState};
    use std::sync::RwLock;

    /// Indexer serving a fixed list of transactions.
    #[derive(Default)]
    struct FixedIndexer {
        transactions: RwLock<Vec<IndexedTransaction>>,
    }

    impl FixedIndexer {
        fn add(&self, location: &str, channel: &str, topics: &[&str], timestamp: u64) {
            self.transactions.write().unwrap().push(IndexedTransaction {
                location: StorageLocation::from(location),
                channel_id: ChannelId::from(channel),
                transaction: Transaction::from_data(location),
                meta: EntryMeta::confirmed(timestamp),
                topics: topics.iter().map(|t| Topic::from(*t)).collect(),
            });
        }

        fn matching(&self, f: impl Fn(&IndexedTransaction) -> bool) -> Vec<IndexedTransaction> {
            self.transactions
                .read()
                .unwrap()
                .iter()
                .filter(|t| f(t))
                .cloned()
                .collect()
        }
    }

    #[async_trait]
    impl Indexer for FixedIndexer {
        async fn initialize(&self) -> AccessResult<()> {
            Ok(())
        }

        async fn close(&self) -> AccessResult<()> {
            Ok(())
        }

        async fn transactions_by_channel_id(
            &self,
            channel_id: &ChannelId,
            boundaries: Option<TimestampBoundaries>,
        ) -> AccessResult<Vec<IndexedTransaction>> {
            let b = boundaries.unwrap_or_default();
            Ok(self.matching(|t| &t.channel_id == channel_id && b.contains(t.meta.timestamp)))
        }

        async fn transactions_by_topics(
            &self,
            topics: &[Topic],
            boundaries: Option<TimestampBoundaries>,
        ) -> AccessResult<Vec<IndexedTransaction>> {
            let b = boundaries.unwrap_or_default();
            let channels: Vec<ChannelId> = self
                .matching(|t| t.topics.iter().any(|x| topics.contains(x)) && b.contains(t.meta.timestamp))
                .into_iter()
                .map(|t| t.channel_id)
                .collect();
            Ok(self.matching(|t| channels.contains(&t.channel_id)))
        }

        async fn transactions_by_storage_location(
            &self,
            location: &StorageLocation,
        ) -> AccessResult<Vec<IndexedTransaction>> {
            Ok(self.matching(|t| &t.location == location))
        }
    }

    fn pending_item(location: &str, topics: &[&str]) -> PendingItem {
        PendingItem {
            transaction: Transaction::from_data(location),
            location: StorageLocation::from(location),
            meta: EntryMeta::pending(1),
            topics: topics.iter().map(|t| Topic::from(*t)).collect(),
        }
    }

    fn reader() -> (Arc<FixedIndexer>, Arc<PendingStore>, DataAccessRead<FixedIndexer>) {
        let indexer = Arc::new(FixedIndexer::default());
        let pending = Arc::new(PendingStore::new());
        let read = DataAccessRead::with_pending_store(Arc::clone(&indexer), Arc::clone(&pending));
        (indexer, pending, read)
    }

    fn c(s: &str) -> ChannelId {
        ChannelId::from(s)
    }

    #[tokio::test]
    async fn channel_read_appends_pending_after_confirmed() {
        let (indexer, pending, read) = reader();
        indexer.add("l1", "c1", &[], 10);
        pending.add(&c("c1"), pending_item("l2", &[]));

        let result = read.transactions_by_channel_id(&c("c1"), None).await.unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result.transactions[0].state, TransactionState::Confirmed);
        assert_eq!(result.transactions[1].state, TransactionState::Pending);
        assert!(result.transactions[1].timestamp >= now_seconds() - 5);
        assert_eq!(result.storage_locations[1], StorageLocation::from("l2"));
        assert_eq!(result.storage_meta[1], EntryMeta::pending(1));
    }

    #[tokio::test]
    async fn confirmed_pending_is_evicted_not_duplicated() {
        let (indexer, pending, read) = reader();
        pending.add(&c("c1"), pending_item("l1", &[]));
        indexer.add("l1", "c1", &[], 10);

        let result = read.transactions_by_channel_id(&c("c1"), None).await.unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.transactions[0].state, TransactionState::Confirmed);
        assert!(pending.is_empty());
    }

    #[tokio::test]
    async fn pending_is_evicted_even_when_outside_read_boundaries() {
        let (indexer, pending, read) = reader();
        pending.add(&c("c1"), pending_item("l1", &[]));
        indexer.add("l1", "c1", &[], 10);

        let result = read
            .transactions_by_channel_id(&c("c1"), Some(TimestampBoundaries::since(50)))
            .await
            .unwrap();
        assert!(result.is_empty());
        assert!(pending.is_empty());
    }

    #[tokio::test]
    async fn reader_without_pending_store() {
        let indexer = Arc::new(FixedIndexer::default());
        indexer.add("l1", "c1", &[], 10);
        let read = DataAccessRead::new(Arc::clone(&indexer));
        assert!(read.pending_store().is_none());
        let result = read.transactions_by_channel_id(&c("c1"), None).await.unwrap();
        assert_eq!(result.len(), 1);
    }

    #[tokio::test]
    async fn topic_read_groups_per_channel() {
        let (indexer, pending, read) = reader();
        indexer.add("l1", "c1", &["t1"], 10);
        indexer.add("l2", "c1", &["other"], 20);
        indexer.add("l3", "c2", &["t1"], 30);
        pending.add(&c("c3"), pending_item("p3", &["t1"]));
        pending.add(&c("c4"), pending_item("p4", &["unrelated"]));

        let result = read
            .channels_by_topic(&Topic::from("t1"), None, None, None)
            .await
            .unwrap();
        assert_eq!(result.channel_ids(), vec![c("c1"), c("c2"), c("c3")]);
        assert_eq!(result.get(&c("c1")).unwrap().len(), 2);
        assert_eq!(
            result.get(&c("c3")).unwrap().transactions[0].state,
            TransactionState::Pending
        );
        assert!(result.pagination.is_none());
    }

    #[tokio::test]
    async fn topic_read_filters_channels_by_boundaries() {
        let (indexer, _, read) = reader();
        indexer.add("l1", "c1", &["t1"], 10);
        indexer.add("l2", "c1", &["t1"], 40);
        indexer.add("l3", "c2", &["t1"], 20);

        let result = read
            .channels_by_topic(
                &Topic::from("t1"),
                Some(TimestampBoundaries::since(30)),
                None,
                None,
            )
            .await
            .unwrap();
        assert_eq!(result.channel_ids(), vec![c("c1")]);
        // The whole channel is returned, not only the matching transaction.
        assert_eq!(result.get(&c("c1")).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn pending_only_channel_excluded_by_past_boundaries() {
        let (_, pending, read) = reader();
        pending.add(&c("c1"), pending_item("p1", &["t1"]));
        let result = read
            .channels_by_topic(&Topic::from("t1"), Some(TimestampBoundaries::until(100)), None, None)
            .await
            .unwrap();
        assert!(result.channels.is_empty());
    }

    #[tokio::test]
    async fn topic_read_paginates_over_channels() {
        let (indexer, pending, read) = reader();
        for (i, channel) in ["c1", "c2", "c3"].iter().enumerate() {
            indexer.add(&format!("l{i}"), channel, &["t"], 10 + i as u64);
        }
        pending.add(&c("c9"), pending_item("p9", &["t"]));

        let topics = [Topic::from("t")];
        let first = read
            .channels_by_multiple_topics(&topics, None, Some(1), Some(2))
            .await
            .unwrap();
        assert_eq!(first.channel_ids(), vec![c("c1"), c("c2")]);
        assert_eq!(
            first.pagination,
            Some(PaginationMeta { total: 4, page: 1, page_size: 2, has_more: true })
        );

        let second = read
            .channels_by_multiple_topics(&topics, None, Some(2), Some(2))
            .await
            .unwrap();
        assert_eq!(second.channel_ids(), vec![c("c3"), c("c9")]);
        assert!(!second.pagination.unwrap().has_more);

        let beyond = read
            .channels_by_multiple_topics(&topics, None, Some(5), Some(2))
            .await
            .unwrap();
        assert!(beyond.channels.is_empty());
    }

    #[tokio::test]
    async fn indexed_pending_write_is_not_counted_as_a_pending_only_channel() {
        let (indexer, pending, read) = reader();
        pending.add(&c("c1"), pending_item("l1", &["t1"]));
        indexer.add("l1", "c1", &["t1"], 100);

        let result = read
            .channels_by_topic(
                &Topic::from("t1"),
                Some(TimestampBoundaries::since(200)),
                Some(1),
                Some(10),
            )
            .await
            .unwrap();
        assert!(result.channels.is_empty());
        assert_eq!(
            result.pagination,
            Some(PaginationMeta { total: 0, page: 1, page_size: 10, has_more: false })
        );
        assert!(pending.is_empty());
    }

    #[tokio::test]
    async fn topic_read_validates_input() {
        let (_, _, read) = reader();
        assert!(matches!(
            read.channels_by_multiple_topics(&[], None, None, None).await,
            Err(AccessError::Validation(_))
        ));
        assert!(matches!(
            read.channels_by_topic(&Topic::from(""), None, None, None).await,
            Err(AccessError::Validation(_))
        ));
        assert!(matches!(
            read.channels_by_topic(&Topic::from("t"), None, Some(0), Some(1)).await,
            Err(AccessError::Validation(_))
        ));
        assert!(matches!(
            read.channels_by_topic(&Topic::from("t"), None, Some(1), None).await,
            Err(AccessError::Validation(_))
        ));
    }
}

//! In-process indexing over a [`Storage`].

use std::sync::Arc;

use async_trait::async_trait;
use dal_block::Block;
use dal_index::TransactionIndex;
use dal_storage::{Storage, StorageEntry};
use dal_sync::{SyncReport, SyncStatus, Synchronizer};
use dal_types::{ChannelId, StorageLocation, TimestampBoundaries, Topic, Transaction};
use tracing::debug;

use crate::combined::CombinedDataAccess;
use crate::config::DataAccessConfig;
use crate::error::{AccessError, AccessResult};
use crate::pending::PendingStore;
use crate::read::DataAccessRead;
use crate::result::{IndexedTransaction, PersistedTransaction};
use crate::traits::{DataWrite, Indexer};
use crate::write::{NoPersistDataWrite, StorageDataWrite};

/// [`Indexer`] backed by a local [`TransactionIndex`] kept up to date by a
/// [`Synchronizer`].
///
/// Lookups resolve locations through the index, then read and parse the
/// blocks from storage.
pub struct LocalIndexer<S> {
    synchronizer: Arc<Synchronizer<S>>,
    auto_synchronization: bool,
}

impl<S: Storage + 'static> LocalIndexer<S> {
    pub fn new(storage: Arc<S>, config: &DataAccessConfig) -> Self {
        let index = Arc::new(TransactionIndex::new());
        Self {
            synchronizer: Arc::new(Synchronizer::new(storage, index, &config.synchronization)),
            auto_synchronization: config.auto_synchronization,
        }
    }

    pub fn synchronizer(&self) -> &Arc<Synchronizer<S>> {
        &self.synchronizer
    }

    /// Run one synchronization pass now.
    pub async fn synchronize(&self) -> AccessResult<SyncReport> {
        Ok(self.synchronizer.synchronize_new_data_ids().await?)
    }

    pub fn status(&self) -> AccessResult<SyncStatus> {
        Ok(self.synchronizer.status()?)
    }

    fn index(&self) -> &TransactionIndex {
        self.synchronizer.index()
    }

    fn check_initialized(&self) -> AccessResult<()> {
        if self.synchronizer.is_initialized() {
            Ok(())
        } else {
            Err(AccessError::NotInitialized)
        }
    }

    async fn read_blocks(
        &self,
        locations: &[StorageLocation],
    ) -> AccessResult<Vec<(StorageEntry, Block)>> {
        let entries = self.synchronizer.storage().read_many(locations).await?;
        entries
            .into_iter()
            .map(|entry| -> AccessResult<(StorageEntry, Block)> {
                let block = Block::parse(&entry.content)?;
                Ok((entry, block))
            })
            .collect()
    }
}

fn indexed(
    entry: &StorageEntry,
    block: &Block,
    channel_id: &ChannelId,
) -> impl Iterator<Item = IndexedTransaction> {
    let topics = block.header().topics_for(channel_id).to_vec();
    let transactions: Vec<Transaction> = block
        .transactions_by_positions(block.positions_for_channel(channel_id))
        .into_iter()
        .cloned()
        .collect();
    let location = entry.location.clone();
    let meta = entry.meta;
    let channel_id = channel_id.clone();
    transactions
        .into_iter()
        .map(move |transaction| IndexedTransaction {
            location: location.clone(),
            channel_id: channel_id.clone(),
            transaction,
            meta,
            topics: topics.clone(),
        })
}

#[async_trait]
impl<S: Storage + 'static> Indexer for LocalIndexer<S> {
    async fn initialize(&self) -> AccessResult<()> {
        self.synchronizer.initialize().await?;
        if self.auto_synchronization {
            self.synchronizer.start_auto_synchronization()?;
        }
        Ok(())
    }

    async fn close(&self) -> AccessResult<()> {
        if self.synchronizer.is_auto_synchronizing() {
            self.synchronizer.stop_auto_synchronization()?;
        }
        Ok(())
    }

    async fn transactions_by_channel_id(
        &self,
        channel_id: &ChannelId,
        boundaries: Option<TimestampBoundaries>,
    ) -> AccessResult<Vec<IndexedTransaction>> {
        self.check_initialized()?;
        let locations = self
            .index()
            .storage_locations(channel_id, boundaries.as_ref())?;
        let blocks = self.read_blocks(&locations).await?;
        Ok(blocks
            .iter()
            .flat_map(|(entry, block)| indexed(entry, block, channel_id))
            .collect())
    }

    async fn transactions_by_topics(
        &self,
        topics: &[Topic],
        boundaries: Option<TimestampBoundaries>,
    ) -> AccessResult<Vec<IndexedTransaction>> {
        self.check_initialized()?;
        let channel_ids = self
            .index()
            .channel_ids_for_multiple_topics(topics, boundaries.as_ref())?;
        let mut transactions = Vec::new();
        for channel_id in &channel_ids {
            transactions.extend(self.transactions_by_channel_id(channel_id, None).await?);
        }
        debug!(
            topics = topics.len(),
            channels = channel_ids.len(),
            transactions = transactions.len(),
            "topic lookup"
        );
        Ok(transactions)
    }

    async fn transactions_by_storage_location(
        &self,
        location: &StorageLocation,
    ) -> AccessResult<Vec<IndexedTransaction>> {
        self.check_initialized()?;
        if self.index().timestamp_of(location).is_none() {
            return Ok(Vec::new());
        }
        let blocks = self.read_blocks(std::slice::from_ref(location)).await?;
        Ok(blocks
            .iter()
            .flat_map(|(entry, block)| {
                block
                    .channel_ids()
                    .keys()
                    .flat_map(move |channel_id| indexed(entry, block, channel_id))
            })
            .collect())
    }
}

impl<S> std::fmt::Debug for LocalIndexer<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalIndexer")
            .field("synchronizer", &self.synchronizer)
            .field("auto_synchronization", &self.auto_synchronization)
            .finish()
    }
}

/// Writer selected by [`DataAccessConfig::persist`].
#[derive(Debug)]
pub enum LocalDataWrite<S> {
    Storage(StorageDataWrite<S>),
    NoPersist(NoPersistDataWrite),
}

#[async_trait]
impl<S: Storage> DataWrite for LocalDataWrite<S> {
    async fn initialize(&self) -> AccessResult<()> {
        match self {
            Self::Storage(w) => w.initialize().await,
            Self::NoPersist(w) => w.initialize().await,
        }
    }

    async fn close(&self) -> AccessResult<()> {
        match self {
            Self::Storage(w) => w.close().await,
            Self::NoPersist(w) => w.close().await,
        }
    }

    async fn persist_transaction(
        &self,
        transaction: Transaction,
        channel_id: &ChannelId,
        topics: &[Topic],
    ) -> AccessResult<PersistedTransaction> {
        match self {
            Self::Storage(w) => w.persist_transaction(transaction, channel_id, topics).await,
            Self::NoPersist(w) => w.persist_transaction(transaction, channel_id, topics).await,
        }
    }
}

/// A complete in-process stack over one storage.
pub type LocalDataAccess<S> = CombinedDataAccess<DataAccessRead<LocalIndexer<S>>, LocalDataWrite<S>>;

/// Wire a [`LocalDataAccess`] over `storage`: a local indexer, a shared
/// pending store, and a writer chosen by `config.persist`.
pub fn local_data_access<S: Storage + 'static>(
    storage: Arc<S>,
    config: &DataAccessConfig,
) -> LocalDataAccess<S> {
    let pending = Arc::new(PendingStore::new());
    let indexer = Arc::new(LocalIndexer::new(Arc::clone(&storage), config));
    let reader = DataAccessRead::with_pending_store(indexer, Arc::clone(&pending));
    let writer = if config.persist {
        LocalDataWrite::Storage(StorageDataWrite::with_pending_store(storage, pending))
    } else {
        LocalDataWrite::NoPersist(NoPersistDataWrite)
    };
    CombinedDataAccess::new(reader, writer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dal_storage::InMemoryStorage;

    fn block_json(entries: &[(&str, &str, &[&str])]) -> String {
        let mut block = Block::empty();
        for (data, channel, topics) in entries {
            let topics: Vec<Topic> = topics.iter().map(|t| Topic::from(*t)).collect();
            block = block
                .push_transaction(Transaction::from_data(*data), &ChannelId::from(*channel), &topics)
                .unwrap();
        }
        block.to_json().unwrap()
    }

    fn indexer(storage: &Arc<InMemoryStorage>) -> LocalIndexer<InMemoryStorage> {
        LocalIndexer::new(Arc::clone(storage), &DataAccessConfig::default())
    }

    #[tokio::test]
    async fn lookups_require_initialization() {
        let storage = Arc::new(InMemoryStorage::new());
        let idx = indexer(&storage);
        assert_eq!(
            idx.transactions_by_channel_id(&ChannelId::from("c1"), None).await,
            Err(AccessError::NotInitialized)
        );
        assert_eq!(idx.status(), Err(AccessError::NotInitialized));
    }

    #[tokio::test]
    async fn channel_lookup_reads_only_that_channels_positions() {
        let storage = Arc::new(InMemoryStorage::new());
        let location = storage.push_raw(
            block_json(&[("a", "c1", &["t1"]), ("b", "c2", &[]), ("c", "c1", &[])]),
            10,
        );
        let idx = indexer(&storage);
        idx.initialize().await.unwrap();

        let found = idx
            .transactions_by_channel_id(&ChannelId::from("c1"), None)
            .await
            .unwrap();
        let data: Vec<_> = found.iter().map(|t| t.transaction.data.clone()).collect();
        assert_eq!(data, vec![Some("a".to_string()), Some("c".to_string())]);
        assert!(found.iter().all(|t| t.location == location));
        assert_eq!(found[0].topics.len(), 3);
    }

    #[tokio::test]
    async fn boundaries_filter_blocks() {
        let storage = Arc::new(InMemoryStorage::new());
        storage.push_raw(block_json(&[("a", "c1", &[])]), 10);
        storage.push_raw(block_json(&[("b", "c1", &[])]), 20);
        let idx = indexer(&storage);
        idx.initialize().await.unwrap();

        let found = idx
            .transactions_by_channel_id(
                &ChannelId::from("c1"),
                Some(TimestampBoundaries::between(15, 25)),
            )
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].meta.timestamp, 20);
    }

    #[tokio::test]
    async fn topic_lookup_returns_whole_channels() {
        let storage = Arc::new(InMemoryStorage::new());
        storage.push_raw(block_json(&[("a", "c1", &["t1"])]), 10);
        storage.push_raw(block_json(&[("b", "c1", &[])]), 20);
        storage.push_raw(block_json(&[("c", "c2", &["t2"])]), 30);
        let idx = indexer(&storage);
        idx.initialize().await.unwrap();

        let found = idx
            .transactions_by_topics(&[Topic::from("t1")], None)
            .await
            .unwrap();
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|t| t.channel_id == ChannelId::from("c1")));
    }

    #[tokio::test]
    async fn location_lookup_only_sees_indexed_blocks() {
        let storage = Arc::new(InMemoryStorage::new());
        let idx = indexer(&storage);
        idx.initialize().await.unwrap();

        let location = storage.push_raw(block_json(&[("a", "c1", &[]), ("b", "c2", &[])]), 10);
        assert!(idx
            .transactions_by_storage_location(&location)
            .await
            .unwrap()
            .is_empty());

        idx.synchronize().await.unwrap();
        let found = idx.transactions_by_storage_location(&location).await.unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(idx.status().unwrap().indexed_count, 1);
    }

    #[tokio::test]
    async fn no_persist_config_selects_ephemeral_writer() {
        let storage = Arc::new(InMemoryStorage::new());
        let config = DataAccessConfig {
            persist: false,
            ..DataAccessConfig::default()
        };
        let access = local_data_access(Arc::clone(&storage), &config);
        assert!(matches!(access.writer(), LocalDataWrite::NoPersist(_)));
    }
}

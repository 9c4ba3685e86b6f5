use async_trait::async_trait;
use dal_types::{ChannelId, StorageLocation, TimestampBoundaries, Topic, Transaction};

use crate::error::AccessResult;
use crate::result::{ChannelsByTopic, IndexedTransaction, PersistedTransaction, TransactionsWithMeta};

/// Source of confirmed, indexed transactions.
#[async_trait]
pub trait Indexer: Send + Sync {
    async fn initialize(&self) -> AccessResult<()>;

    async fn close(&self) -> AccessResult<()>;

    /// Transactions of `channel_id` stored within `boundaries`.
    async fn transactions_by_channel_id(
        &self,
        channel_id: &ChannelId,
        boundaries: Option<TimestampBoundaries>,
    ) -> AccessResult<Vec<IndexedTransaction>>;

    /// Every transaction of every channel indexed under one of `topics` that
    /// has at least one transaction within `boundaries`.
    async fn transactions_by_topics(
        &self,
        topics: &[Topic],
        boundaries: Option<TimestampBoundaries>,
    ) -> AccessResult<Vec<IndexedTransaction>>;

    /// Transactions of the block at `location`; empty if it is not indexed.
    async fn transactions_by_storage_location(
        &self,
        location: &StorageLocation,
    ) -> AccessResult<Vec<IndexedTransaction>>;
}

/// Read half of a data-access stack.
#[async_trait]
pub trait DataRead: Send + Sync {
    async fn initialize(&self) -> AccessResult<()>;

    async fn close(&self) -> AccessResult<()>;

    async fn transactions_by_channel_id(
        &self,
        channel_id: &ChannelId,
        boundaries: Option<TimestampBoundaries>,
    ) -> AccessResult<TransactionsWithMeta>;

    async fn channels_by_topic(
        &self,
        topic: &Topic,
        boundaries: Option<TimestampBoundaries>,
        page: Option<usize>,
        page_size: Option<usize>,
    ) -> AccessResult<ChannelsByTopic> {
        self.channels_by_multiple_topics(std::slice::from_ref(topic), boundaries, page, page_size)
            .await
    }

    async fn channels_by_multiple_topics(
        &self,
        topics: &[Topic],
        boundaries: Option<TimestampBoundaries>,
        page: Option<usize>,
        page_size: Option<usize>,
    ) -> AccessResult<ChannelsByTopic>;
}

/// Write half of a data-access stack.
#[async_trait]
pub trait DataWrite: Send + Sync {
    async fn initialize(&self) -> AccessResult<()>;

    async fn close(&self) -> AccessResult<()>;

    /// Wrap `transaction` in a one-transaction block and append it.
    async fn persist_transaction(
        &self,
        transaction: Transaction,
        channel_id: &ChannelId,
        topics: &[Topic],
    ) -> AccessResult<PersistedTransaction>;
}

/// The complete surface exposed to callers.
#[async_trait]
pub trait DataAccess: Send + Sync {
    async fn initialize(&self) -> AccessResult<()>;

    async fn close(&self) -> AccessResult<()>;

    async fn transactions_by_channel_id(
        &self,
        channel_id: &ChannelId,
        boundaries: Option<TimestampBoundaries>,
    ) -> AccessResult<TransactionsWithMeta>;

    async fn channels_by_topic(
        &self,
        topic: &Topic,
        boundaries: Option<TimestampBoundaries>,
        page: Option<usize>,
        page_size: Option<usize>,
    ) -> AccessResult<ChannelsByTopic>;

    async fn channels_by_multiple_topics(
        &self,
        topics: &[Topic],
        boundaries: Option<TimestampBoundaries>,
        page: Option<usize>,
        page_size: Option<usize>,
    ) -> AccessResult<ChannelsByTopic>;

    async fn persist_transaction(
        &self,
        transaction: Transaction,
        channel_id: &ChannelId,
        topics: &[Topic],
    ) -> AccessResult<PersistedTransaction>;
}

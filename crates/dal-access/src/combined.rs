//! One reader and one writer behind the full [`DataAccess`] surface.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use dal_types::{ChannelId, TimestampBoundaries, Topic, Transaction};
use tracing::info;

use crate::error::{AccessError, AccessResult};
use crate::result::{ChannelsByTopic, PersistedTransaction, TransactionsWithMeta};
use crate::traits::{DataAccess, DataRead, DataWrite};
use crate::write::{NoPersistDataWrite, ReadOnlyDataWrite};

/// Facade delegating reads to `R` and writes to `W`.
///
/// The reader is initialized before the writer and closed after it, so the
/// writer never runs without a ready reader.
pub struct CombinedDataAccess<R, W> {
    reader: R,
    writer: W,
    initialized: AtomicBool,
}

impl<R: DataRead, W: DataWrite> CombinedDataAccess<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            initialized: AtomicBool::new(false),
        }
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    fn check_initialized(&self) -> AccessResult<()> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(AccessError::NotInitialized)
        }
    }
}

impl<R: DataRead> CombinedDataAccess<R, ReadOnlyDataWrite> {
    /// A facade whose writes always fail.
    pub fn read_only(reader: R) -> Self {
        Self::new(reader, ReadOnlyDataWrite)
    }
}

impl<R: DataRead> CombinedDataAccess<R, NoPersistDataWrite> {
    /// A facade whose writes are validated but never stored.
    pub fn no_persist(reader: R) -> Self {
        Self::new(reader, NoPersistDataWrite)
    }
}

#[async_trait]
impl<R: DataRead, W: DataWrite> DataAccess for CombinedDataAccess<R, W> {
    async fn initialize(&self) -> AccessResult<()> {
        if self.is_initialized() {
            return Err(AccessError::AlreadyInitialized);
        }
        self.reader.initialize().await?;
        self.writer.initialize().await?;
        self.initialized.store(true, Ordering::Release);
        info!("data access initialized");
        Ok(())
    }

    async fn close(&self) -> AccessResult<()> {
        self.initialized.store(false, Ordering::Release);
        self.writer.close().await?;
        self.reader.close().await?;
        info!("data access closed");
        Ok(())
    }

    async fn transactions_by_channel_id(
        &self,
        channel_id: &ChannelId,
        boundaries: Option<TimestampBoundaries>,
    ) -> AccessResult<TransactionsWithMeta> {
        self.check_initialized()?;
        self.reader
            .transactions_by_channel_id(channel_id, boundaries)
            .await
    }

    async fn channels_by_topic(
        &self,
        topic: &Topic,
        boundaries: Option<TimestampBoundaries>,
        page: Option<usize>,
        page_size: Option<usize>,
    ) -> AccessResult<ChannelsByTopic> {
        self.check_initialized()?;
        self.reader
            .channels_by_topic(topic, boundaries, page, page_size)
            .await
    }

    async fn channels_by_multiple_topics(
        &self,
        topics: &[Topic],
        boundaries: Option<TimestampBoundaries>,
        page: Option<usize>,
        page_size: Option<usize>,
    ) -> AccessResult<ChannelsByTopic> {
        self.check_initialized()?;
        self.reader
            .channels_by_multiple_topics(topics, boundaries, page, page_size)
            .await
    }

    async fn persist_transaction(
        &self,
        transaction: Transaction,
        channel_id: &ChannelId,
        topics: &[Topic],
    ) -> AccessResult<PersistedTransaction> {
        self.check_initialized()?;
        self.writer
            .persist_transaction(transaction, channel_id, topics)
            .await
    }
}

impl<R, W> std::fmt::Debug for CombinedDataAccess<R, W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CombinedDataAccess")
            .field("initialized", &self.initialized.load(Ordering::Acquire))
            .finish()
    }
}

//! Write variants: persisting, ephemeral and read-only.

use std::sync::Arc;

use async_trait::async_trait;
use dal_block::Block;
use dal_storage::{AppendOutcome, Confirmation, Storage};
use dal_types::{now_seconds, ChannelId, EntryMeta, StorageLocation, Topic, Transaction};
use tracing::debug;

use crate::error::{AccessError, AccessResult};
use crate::pending::{PendingItem, PendingStore};
use crate::result::PersistedTransaction;
use crate::traits::DataWrite;

/// Check caller input and build the one-transaction block to append.
fn build_block(
    transaction: Transaction,
    channel_id: &ChannelId,
    topics: &[Topic],
) -> AccessResult<Block> {
    if channel_id.is_empty() {
        return Err(AccessError::Validation("channel id must not be empty".into()));
    }
    if topics.iter().any(Topic::is_empty) {
        return Err(AccessError::Validation("topics must not be empty".into()));
    }
    Ok(Block::empty().push_transaction(transaction, channel_id, topics)?)
}

/// Appends each transaction as its own block to a [`Storage`].
///
/// With a [`PendingStore`] attached, the write is registered as pending as
/// soon as the append returns, before the log confirms it.
pub struct StorageDataWrite<S> {
    storage: Arc<S>,
    pending: Option<Arc<PendingStore>>,
}

impl<S: Storage> StorageDataWrite<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self {
            storage,
            pending: None,
        }
    }

    pub fn with_pending_store(storage: Arc<S>, pending: Arc<PendingStore>) -> Self {
        Self {
            storage,
            pending: Some(pending),
        }
    }
}

#[async_trait]
impl<S: Storage> DataWrite for StorageDataWrite<S> {
    async fn initialize(&self) -> AccessResult<()> {
        self.storage.initialize().await?;
        Ok(())
    }

    async fn close(&self) -> AccessResult<()> {
        Ok(())
    }

    async fn persist_transaction(
        &self,
        transaction: Transaction,
        channel_id: &ChannelId,
        topics: &[Topic],
    ) -> AccessResult<PersistedTransaction> {
        let block = build_block(transaction.clone(), channel_id, topics)?;
        let appended = self.storage.append(block.to_json()?).await?;
        debug!(
            channel_id = %channel_id,
            location = %appended.location,
            confirmed = appended.meta.is_confirmed(),
            "transaction appended"
        );

        if let Some(pending) = &self.pending {
            pending.add(
                channel_id,
                PendingItem {
                    transaction,
                    location: appended.location.clone(),
                    meta: appended.meta,
                    topics: block.header().topics_for(channel_id).to_vec(),
                },
            );
        }

        Ok(PersistedTransaction {
            location: appended.location,
            meta: appended.meta,
            topics: topics.to_vec(),
            confirmation: appended.confirmation,
        })
    }
}

impl<S> std::fmt::Debug for StorageDataWrite<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageDataWrite")
            .field("pending", &self.pending.is_some())
            .finish()
    }
}

/// Validates and builds the block, then reports it confirmed without
/// touching any storage. The location is empty.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPersistDataWrite;

#[async_trait]
impl DataWrite for NoPersistDataWrite {
    async fn initialize(&self) -> AccessResult<()> {
        Ok(())
    }

    async fn close(&self) -> AccessResult<()> {
        Ok(())
    }

    async fn persist_transaction(
        &self,
        transaction: Transaction,
        channel_id: &ChannelId,
        topics: &[Topic],
    ) -> AccessResult<PersistedTransaction> {
        build_block(transaction, channel_id, topics)?;
        let meta = EntryMeta::confirmed(now_seconds());
        debug!(channel_id = %channel_id, "transaction not persisted");
        Ok(PersistedTransaction {
            location: StorageLocation::none(),
            meta,
            topics: topics.to_vec(),
            confirmation: Confirmation::resolved(
                StorageLocation::none(),
                AppendOutcome::Confirmed(meta),
            ),
        })
    }
}

/// Refuses every write.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReadOnlyDataWrite;

#[async_trait]
impl DataWrite for ReadOnlyDataWrite {
    async fn initialize(&self) -> AccessResult<()> {
        Ok(())
    }

    async fn close(&self) -> AccessResult<()> {
        Ok(())
    }

    async fn persist_transaction(
        &self,
        _transaction: Transaction,
        _channel_id: &ChannelId,
        _topics: &[Topic],
    ) -> AccessResult<PersistedTransaction> {
        Err(AccessError::ReadOnly)
    }
}

//! Values returned by read and write operations.

use std::collections::BTreeMap;

use dal_storage::Confirmation;
use dal_types::{ChannelId, EntryMeta, StorageLocation, TimestampedTransaction, Topic, Transaction};
use serde::{Deserialize, Serialize};

use crate::error::{AccessError, AccessResult};

/// One confirmed transaction as an [`Indexer`](crate::Indexer) reports it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedTransaction {
    pub location: StorageLocation,
    pub channel_id: ChannelId,
    pub transaction: Transaction,
    pub meta: EntryMeta,
    /// Topics the channel is indexed under in the block holding the transaction.
    pub topics: Vec<Topic>,
}

impl IndexedTransaction {
    pub fn to_timestamped(&self) -> TimestampedTransaction {
        TimestampedTransaction {
            state: self.meta.state.into(),
            timestamp: self.meta.timestamp,
            transaction: self.transaction.clone(),
        }
    }
}

/// Transactions of one channel.
///
/// `storage_locations` and `storage_meta` are aligned with `transactions`:
/// entry `i` of each describes the same transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionsWithMeta {
    pub transactions: Vec<TimestampedTransaction>,
    pub storage_locations: Vec<StorageLocation>,
    pub storage_meta: Vec<EntryMeta>,
}

impl TransactionsWithMeta {
    pub fn push(
        &mut self,
        transaction: TimestampedTransaction,
        location: StorageLocation,
        meta: EntryMeta,
    ) {
        self.transactions.push(transaction);
        self.storage_locations.push(location);
        self.storage_meta.push(meta);
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

impl FromIterator<IndexedTransaction> for TransactionsWithMeta {
    fn from_iter<I: IntoIterator<Item = IndexedTransaction>>(iter: I) -> Self {
        let mut out = Self::default();
        for indexed in iter {
            out.push(indexed.to_timestamped(), indexed.location, indexed.meta);
        }
        out
    }
}

/// Requested page of a topic query. Pages start at 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: usize,
    pub page_size: usize,
}

impl Pagination {
    /// Validate optional caller-supplied parameters.
    ///
    /// Both absent means "no pagination". Otherwise both must be present and
    /// at least 1.
    pub fn from_parts(page: Option<usize>, page_size: Option<usize>) -> AccessResult<Option<Self>> {
        match (page, page_size) {
            (None, None) => Ok(None),
            (Some(page), Some(page_size)) => {
                if page < 1 {
                    return Err(AccessError::Validation(format!(
                        "page number must be greater than or equal to 1, but it is {page}"
                    )));
                }
                if page_size < 1 {
                    return Err(AccessError::Validation(format!(
                        "page size must be greater than 0, but it is {page_size}"
                    )));
                }
                Ok(Some(Self { page, page_size }))
            }
            _ => Err(AccessError::Validation(
                "page and page size must be given together".into(),
            )),
        }
    }

    /// Index range of this page within `total` items.
    pub fn range(&self, total: usize) -> std::ops::Range<usize> {
        let start = (self.page - 1).saturating_mul(self.page_size).min(total);
        let end = start.saturating_add(self.page_size).min(total);
        start..end
    }
}

/// Pagination details attached to a paginated topic query.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationMeta {
    /// Number of channels matching the query across all pages.
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
    pub has_more: bool,
}

/// Result of a topic query: the matching channels with their transactions.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelsByTopic {
    pub channels: BTreeMap<ChannelId, TransactionsWithMeta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationMeta>,
}

impl ChannelsByTopic {
    pub fn channel_ids(&self) -> Vec<ChannelId> {
        self.channels.keys().cloned().collect()
    }

    pub fn get(&self, channel_id: &ChannelId) -> Option<&TransactionsWithMeta> {
        self.channels.get(channel_id)
    }
}

/// Result of a write.
///
/// `location` and `meta` are known as soon as the append returns; the
/// terminal outcome arrives later through `confirmation`.
#[derive(Debug)]
pub struct PersistedTransaction {
    pub location: StorageLocation,
    pub meta: EntryMeta,
    pub topics: Vec<Topic>,
    pub confirmation: Confirmation,
}

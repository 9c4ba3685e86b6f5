//! The [`Block`] value and its query operations.

use std::collections::{BTreeMap, BTreeSet};

use dal_crypto::transaction_hash;
use dal_types::{ChannelId, Topic, Transaction};
use serde::{Deserialize, Serialize};

use crate::error::{BlockError, BlockResult};

/// Schema version written into every block header.
pub const BLOCK_VERSION: &str = "0.1.0";

/// Derived header of a block.
///
/// `channel_ids` maps a channel to the positions of its transactions in the
/// block; `topics` maps a channel to the topics it is indexed under, in
/// insertion order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub(crate) version: String,
    #[serde(rename = "channelIds")]
    pub(crate) channel_ids: BTreeMap<ChannelId, Vec<usize>>,
    pub(crate) topics: BTreeMap<ChannelId, Vec<Topic>>,
}

impl BlockHeader {
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn channel_ids(&self) -> &BTreeMap<ChannelId, Vec<usize>> {
        &self.channel_ids
    }

    pub fn topics(&self) -> &BTreeMap<ChannelId, Vec<Topic>> {
        &self.topics
    }

    /// Topics recorded for one channel (empty if the channel is absent).
    pub fn topics_for(&self, channel_id: &ChannelId) -> &[Topic] {
        self.topics.get(channel_id).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl Default for BlockHeader {
    fn default() -> Self {
        Self {
            version: BLOCK_VERSION.to_string(),
            channel_ids: BTreeMap::new(),
            topics: BTreeMap::new(),
        }
    }
}

/// An immutable batch of transactions with its channel/topic header.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub(crate) header: BlockHeader,
    pub(crate) transactions: Vec<Transaction>,
}

impl Block {
    /// A block with an empty header at the current schema version.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Return a new block with `transaction` appended under `channel_id`.
    ///
    /// The transaction's position is appended to the channel's position list
    /// and `topics` followed by the transaction hash are appended to the
    /// channel's topic list. `self` is left unchanged.
    pub fn push_transaction(
        &self,
        transaction: Transaction,
        channel_id: &ChannelId,
        topics: &[Topic],
    ) -> BlockResult<Block> {
        if !transaction.has_payload() {
            return Err(BlockError::MissingPayload);
        }
        let hash = transaction_hash(&transaction)?;

        let mut next = self.clone();
        let position = next.transactions.len();
        next.transactions.push(transaction);

        next.header
            .channel_ids
            .entry(channel_id.clone())
            .or_default()
            .push(position);

        let channel_topics = next.header.topics.entry(channel_id.clone()).or_default();
        channel_topics.extend(topics.iter().cloned());
        channel_topics.push(hash.to_topic());

        Ok(next)
    }

    pub fn header(&self) -> &BlockHeader {
        &self.header
    }

    /// Consume the block, keeping only its header.
    pub fn into_header(self) -> BlockHeader {
        self.header
    }

    /// All transactions in block order.
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Number of transactions.
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    /// Returns `true` if the block holds no transactions.
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// The transaction at `position`, if any.
    pub fn transaction_at(&self, position: usize) -> Option<&Transaction> {
        self.transactions.get(position)
    }

    /// Transactions at the given positions.
    ///
    /// Duplicates are removed, the result follows ascending position order,
    /// and positions outside the block are dropped.
    pub fn transactions_by_positions(&self, positions: &[usize]) -> Vec<&Transaction> {
        positions
            .iter()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .filter_map(|position| self.transactions.get(position))
            .collect()
    }

    pub fn channel_ids(&self) -> &BTreeMap<ChannelId, Vec<usize>> {
        &self.header.channel_ids
    }

    pub fn topics(&self) -> &BTreeMap<ChannelId, Vec<Topic>> {
        &self.header.topics
    }

    /// Positions of the transactions recorded under `channel_id`.
    pub fn positions_for_channel(&self, channel_id: &ChannelId) -> &[usize] {
        self.header
            .channel_ids
            .get(channel_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Union of the positions of several channels, deduplicated and ascending.
    pub fn positions_for_channels(&self, channel_ids: &[ChannelId]) -> Vec<usize> {
        channel_ids
            .iter()
            .filter_map(|id| self.header.channel_ids.get(id))
            .flatten()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

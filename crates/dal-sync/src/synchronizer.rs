//! Index replay and periodic catch-up against the durable log.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use dal_block::Block;
use dal_index::TransactionIndex;
use dal_storage::{Storage, StorageEntry};
use dal_types::{now_seconds, Timestamp, TimestampBoundaries};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::timer::{IntervalTimer, PeriodicTask};

/// Outcome of one synchronization pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    /// Blocks parsed and fed to the index.
    pub indexed: usize,
    /// Entries skipped because they were not valid blocks.
    pub ignored: usize,
    /// Watermark after the pass.
    pub watermark: Timestamp,
}

/// What the synchronizer has incorporated so far.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStatus {
    pub last_sync_timestamp: Timestamp,
    pub last_transaction_timestamp: Option<Timestamp>,
    pub indexed_count: usize,
    pub ignored_count: usize,
    pub channel_count: usize,
    pub topic_count: usize,
}

#[derive(Debug, Default)]
struct SyncState {
    initialized: bool,
    /// Last timestamp reported by the log. Never wall-clock time: the log
    /// may still surface entries older than "now".
    last_sync_timestamp: Timestamp,
}

/// Keeps a [`TransactionIndex`] in step with a [`Storage`].
pub struct Synchronizer<S> {
    storage: Arc<S>,
    index: Arc<TransactionIndex>,
    state: RwLock<SyncState>,
    timer: IntervalTimer,
}

impl<S: Storage + 'static> Synchronizer<S> {
    pub fn new(storage: Arc<S>, index: Arc<TransactionIndex>, config: &SyncConfig) -> Self {
        Self {
            storage,
            index,
            state: RwLock::new(SyncState::default()),
            timer: IntervalTimer::new(config.interval(), config.error_threshold),
        }
    }

    pub fn index(&self) -> &Arc<TransactionIndex> {
        &self.index
    }

    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    pub fn is_initialized(&self) -> bool {
        self.state.read().expect("lock poisoned").initialized
    }

    /// Watermark of the last successful pass, `0` before any data was seen.
    pub fn last_sync_timestamp(&self) -> Timestamp {
        self.state.read().expect("lock poisoned").last_sync_timestamp
    }

    /// Replay every entry the log holds up to now into a fresh index.
    ///
    /// Any malformed entry aborts with [`SyncError::MalformedEntry`] and the
    /// live index is left as it was.
    pub async fn initialize(&self) -> SyncResult<SyncReport> {
        if self.is_initialized() {
            return Err(SyncError::AlreadyInitialized);
        }
        self.storage.initialize().await?;

        let batch = self
            .storage
            .get_data(Some(TimestampBoundaries::until(now_seconds())))
            .await?;

        let fresh = TransactionIndex::new();
        for entry in &batch.entries {
            let block = Block::parse(&entry.content).map_err(|source| SyncError::MalformedEntry {
                location: entry.location.clone(),
                source,
            })?;
            fresh.add_transaction(&entry.location, block.header(), entry.meta.timestamp);
        }

        let mut state = self.state.write().expect("lock poisoned");
        if state.initialized {
            return Err(SyncError::AlreadyInitialized);
        }
        self.index.replace_with(fresh);
        state.initialized = true;
        state.last_sync_timestamp = batch.last_timestamp;

        let report = SyncReport {
            indexed: batch.entries.len(),
            ignored: 0,
            watermark: state.last_sync_timestamp,
        };
        info!(
            indexed = report.indexed,
            watermark = report.watermark,
            "index initialized from storage"
        );
        Ok(report)
    }

    /// Index entries newer than the watermark.
    ///
    /// Malformed entries are recorded as ignored and skipped. The watermark
    /// advances to the last timestamp the log reported for the batch.
    pub async fn synchronize_new_data_ids(&self) -> SyncResult<SyncReport> {
        let watermark = {
            let state = self.state.read().expect("lock poisoned");
            if !state.initialized {
                return Err(SyncError::NotInitialized);
            }
            state.last_sync_timestamp
        };

        // A zero watermark re-reads entries stamped 0; indexing them again is a no-op.
        let from = if watermark > 0 { watermark + 1 } else { 0 };
        let batch = self
            .storage
            .get_data(Some(TimestampBoundaries::between(from, now_seconds())))
            .await?;

        let mut report = SyncReport::default();
        for entry in &batch.entries {
            if self.index_entry(entry) {
                report.indexed += 1;
            } else {
                report.ignored += 1;
            }
        }

        let mut state = self.state.write().expect("lock poisoned");
        state.last_sync_timestamp = state.last_sync_timestamp.max(batch.last_timestamp);
        report.watermark = state.last_sync_timestamp;

        info!(
            indexed = report.indexed,
            ignored = report.ignored,
            watermark = report.watermark,
            "synchronization pass complete"
        );
        Ok(report)
    }

    fn index_entry(&self, entry: &StorageEntry) -> bool {
        match Block::parse(&entry.content) {
            Ok(block) => {
                self.index
                    .add_transaction(&entry.location, block.header(), entry.meta.timestamp);
                true
            }
            Err(e) => {
                warn!(location = %entry.location, error = %e, "skipping malformed entry");
                self.index.add_ignored(&entry.location, e.to_string());
                false
            }
        }
    }

    pub fn status(&self) -> SyncResult<SyncStatus> {
        let last_sync_timestamp = {
            let state = self.state.read().expect("lock poisoned");
            if !state.initialized {
                return Err(SyncError::NotInitialized);
            }
            state.last_sync_timestamp
        };
        let counts = self.index.counts();
        Ok(SyncStatus {
            last_sync_timestamp,
            last_transaction_timestamp: self.index.last_transaction_timestamp(),
            indexed_count: counts.indexed,
            ignored_count: counts.ignored,
            channel_count: counts.channels,
            topic_count: counts.topics,
        })
    }

    // ---------------------------------------------------------------
    // Automatic synchronization
    // ---------------------------------------------------------------

    /// Run [`synchronize_new_data_ids`](Self::synchronize_new_data_ids) on the
    /// configured interval. Requires an initialized synchronizer.
    pub fn start_auto_synchronization(self: &Arc<Self>) -> SyncResult<()> {
        if !self.is_initialized() {
            return Err(SyncError::NotInitialized);
        }
        self.timer.start(Arc::clone(self))
    }

    pub fn stop_auto_synchronization(&self) -> SyncResult<()> {
        self.timer.stop()
    }

    pub fn is_auto_synchronizing(&self) -> bool {
        self.timer.is_started()
    }

    pub fn timer(&self) -> &IntervalTimer {
        &self.timer
    }
}

#[async_trait]
impl<S: Storage + 'static> PeriodicTask for Synchronizer<S> {
    async fn run(&self) -> SyncResult<()> {
        let report = self.synchronize_new_data_ids().await?;
        debug!(indexed = report.indexed, "periodic synchronization ran");
        Ok(())
    }
}

impl<S> std::fmt::Debug for Synchronizer<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read().expect("lock poisoned");
        f.debug_struct("Synchronizer")
            .field("initialized", &state.initialized)
            .field("last_sync_timestamp", &state.last_sync_timestamp)
            .field("index", &self.index)
            .field("timer", &self.timer)
            .finish()
    }
}

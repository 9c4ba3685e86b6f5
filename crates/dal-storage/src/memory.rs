use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use dal_crypto::ContentHasher;
use dal_types::{now_seconds, EntryMeta, StorageLocation, Timestamp, TimestampBoundaries};
use tracing::debug;

use crate::confirmation::{confirmation_channel, AppendOutcome, Confirmation, ConfirmationSender};
use crate::entry::{AppendResult, StorageBatch, StorageEntry};
use crate::error::{StorageError, StorageResult};
use crate::traits::Storage;

/// In-memory, content-addressed durable log.
///
/// Intended for tests and embedding. Locations are the BLAKE3 hash of the
/// appended content, so appending identical content twice is idempotent.
///
/// By default appends are confirmed immediately. A store built with
/// [`InMemoryStorage::with_manual_confirmation`] keeps appends pending until
/// [`confirm`](Self::confirm) or [`fail`](Self::fail) is called, which lets
/// tests drive the confirmation race explicitly.
pub struct InMemoryStorage {
    manual_confirmation: bool,
    inner: RwLock<LogState>,
}

#[derive(Default)]
struct LogState {
    confirmed: Vec<StorageEntry>,
    by_location: HashMap<StorageLocation, usize>,
    unconfirmed: HashMap<StorageLocation, Unconfirmed>,
    fixed_time: Option<Timestamp>,
}

struct Unconfirmed {
    content: String,
    meta: EntryMeta,
    waiters: Vec<ConfirmationSender>,
}

impl LogState {
    fn now(&self) -> Timestamp {
        self.fixed_time.unwrap_or_else(now_seconds)
    }

    fn insert_confirmed(&mut self, location: StorageLocation, content: String, meta: EntryMeta) {
        self.by_location.insert(location.clone(), self.confirmed.len());
        self.confirmed.push(StorageEntry {
            location,
            content,
            meta,
        });
    }
}

impl InMemoryStorage {
    /// Create an empty log that confirms appends immediately.
    pub fn new() -> Self {
        Self {
            manual_confirmation: false,
            inner: RwLock::new(LogState::default()),
        }
    }

    /// Create an empty log whose appends stay pending until confirmed.
    pub fn with_manual_confirmation() -> Self {
        Self {
            manual_confirmation: true,
            inner: RwLock::new(LogState::default()),
        }
    }

    /// Pin the clock used to timestamp appends.
    pub fn set_time(&self, timestamp: Timestamp) {
        self.inner.write().expect("lock poisoned").fixed_time = Some(timestamp);
    }

    /// Insert an already-confirmed entry with an explicit timestamp,
    /// bypassing any validation. Used to seed history (including malformed
    /// content) the way another writer would have left it.
    pub fn push_raw(&self, content: impl Into<String>, timestamp: Timestamp) -> StorageLocation {
        let content = content.into();
        let location = location_of(&content);
        let mut state = self.inner.write().expect("lock poisoned");
        if !state.by_location.contains_key(&location) {
            state.insert_confirmed(location.clone(), content, EntryMeta::confirmed(timestamp));
        }
        location
    }

    /// Confirm a pending append at `timestamp`.
    pub fn confirm(&self, location: &StorageLocation, timestamp: Timestamp) -> StorageResult<()> {
        let pending = {
            let mut state = self.inner.write().expect("lock poisoned");
            let pending = state
                .unconfirmed
                .remove(location)
                .ok_or_else(|| StorageError::NotPending(location.clone()))?;
            let meta = EntryMeta::confirmed(timestamp);
            state.insert_confirmed(location.clone(), pending.content, meta);
            pending.waiters
        };
        debug!(%location, timestamp, "entry confirmed");
        for waiter in pending {
            waiter.confirm(EntryMeta::confirmed(timestamp));
        }
        Ok(())
    }

    /// Fail a pending append. The entry is discarded.
    pub fn fail(&self, location: &StorageLocation, reason: &str) -> StorageResult<()> {
        let pending = self
            .inner
            .write()
            .expect("lock poisoned")
            .unconfirmed
            .remove(location)
            .ok_or_else(|| StorageError::NotPending(location.clone()))?;
        debug!(%location, reason, "entry failed");
        for waiter in pending.waiters {
            waiter.fail(reason);
        }
        Ok(())
    }

    /// Number of confirmed entries.
    pub fn len(&self) -> usize {
        self.inner.read().expect("lock poisoned").confirmed.len()
    }

    /// Returns `true` if no entry has been confirmed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of appends still awaiting confirmation.
    pub fn pending_count(&self) -> usize {
        self.inner.read().expect("lock poisoned").unconfirmed.len()
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

fn location_of(content: &str) -> StorageLocation {
    ContentHasher::BLOCK.hash(content.as_bytes()).to_location()
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn initialize(&self) -> StorageResult<()> {
        Ok(())
    }

    async fn append(&self, content: String) -> StorageResult<AppendResult> {
        let location = location_of(&content);
        let mut state = self.inner.write().expect("lock poisoned");

        // Idempotent: identical content maps to the same entry.
        if let Some(&index) = state.by_location.get(&location) {
            let meta = state.confirmed[index].meta;
            return Ok(AppendResult {
                confirmation: Confirmation::resolved(
                    location.clone(),
                    AppendOutcome::Confirmed(meta),
                ),
                location,
                meta,
            });
        }

        let now = state.now();
        if !self.manual_confirmation {
            let meta = EntryMeta::confirmed(now);
            state.insert_confirmed(location.clone(), content, meta);
            debug!(%location, timestamp = now, "entry appended and confirmed");
            return Ok(AppendResult {
                confirmation: Confirmation::resolved(
                    location.clone(),
                    AppendOutcome::Confirmed(meta),
                ),
                location,
                meta,
            });
        }

        let (sender, confirmation) = confirmation_channel(location.clone());
        let pending = state
            .unconfirmed
            .entry(location.clone())
            .or_insert_with(|| Unconfirmed {
                content,
                meta: EntryMeta::pending(now),
                waiters: Vec::new(),
            });
        pending.waiters.push(sender);
        let meta = pending.meta;
        debug!(%location, timestamp = now, "entry appended, awaiting confirmation");

        Ok(AppendResult {
            location,
            meta,
            confirmation,
        })
    }

    async fn read(&self, location: &StorageLocation) -> StorageResult<StorageEntry> {
        let state = self.inner.read().expect("lock poisoned");
        if let Some(&index) = state.by_location.get(location) {
            return Ok(state.confirmed[index].clone());
        }
        state
            .unconfirmed
            .get(location)
            .map(|pending| StorageEntry {
                location: location.clone(),
                content: pending.content.clone(),
                meta: pending.meta,
            })
            .ok_or_else(|| StorageError::NotFound(location.clone()))
    }

    async fn get_data(
        &self,
        boundaries: Option<TimestampBoundaries>,
    ) -> StorageResult<StorageBatch> {
        let boundaries = boundaries.unwrap_or_default();
        let state = self.inner.read().expect("lock poisoned");
        let mut entries: Vec<StorageEntry> = state
            .confirmed
            .iter()
            .filter(|entry| boundaries.contains(entry.meta.timestamp))
            .cloned()
            .collect();
        entries.sort_by_key(|entry| entry.meta.timestamp);
        let last_timestamp = entries.last().map_or(0, |entry| entry.meta.timestamp);
        Ok(StorageBatch {
            entries,
            last_timestamp,
        })
    }
}

impl std::fmt::Debug for InMemoryStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStorage")
            .field("confirmed", &self.len())
            .field("pending", &self.pending_count())
            .field("manual_confirmation", &self.manual_confirmation)
            .finish()
    }
}

use async_trait::async_trait;
use dal_types::{StorageLocation, TimestampBoundaries};

use crate::entry::{AppendResult, StorageBatch, StorageEntry};
use crate::error::StorageResult;

/// The durable, eventually-confirmed append log.
///
/// Every implementation guarantees:
/// - Entries are immutable once appended.
/// - `append` returns as soon as the location is known; confirmation is
///   delivered later, at most once, through [`AppendResult::confirmation`].
/// - `get_data` only returns confirmed entries, ordered by timestamp.
/// - The log never interprets entry contents.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Prepare the backend. Calling it more than once is allowed.
    async fn initialize(&self) -> StorageResult<()>;

    /// Append `content` and return its provisional location.
    async fn append(&self, content: String) -> StorageResult<AppendResult>;

    /// Read one entry. Fails with `NotFound` for unknown locations.
    async fn read(&self, location: &StorageLocation) -> StorageResult<StorageEntry>;

    /// Read several entries.
    ///
    /// Default implementation calls `read()` for each location. Backends may
    /// override for fewer round-trips.
    async fn read_many(&self, locations: &[StorageLocation]) -> StorageResult<Vec<StorageEntry>> {
        let mut entries = Vec::with_capacity(locations.len());
        for location in locations {
            entries.push(self.read(location).await?);
        }
        Ok(entries)
    }

    /// Confirmed entries whose timestamp falls in `boundaries`; `None` means
    /// the whole log.
    async fn get_data(&self, boundaries: Option<TimestampBoundaries>)
        -> StorageResult<StorageBatch>;
}

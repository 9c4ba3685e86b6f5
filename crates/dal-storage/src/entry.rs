use dal_types::{EntryMeta, StorageLocation, Timestamp};
use serde::{Deserialize, Serialize};

use crate::confirmation::Confirmation;

/// One entry of the durable log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageEntry {
    pub location: StorageLocation,
    pub content: String,
    pub meta: EntryMeta,
}

/// Entries returned by [`Storage::get_data`](crate::Storage::get_data).
///
/// `last_timestamp` is the highest timestamp the log covered with this batch;
/// synchronization uses it as its next watermark.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageBatch {
    pub entries: Vec<StorageEntry>,
    pub last_timestamp: Timestamp,
}

/// Result of an append: the provisional location and metadata, available
/// synchronously, plus the pending confirmation.
#[derive(Debug)]
pub struct AppendResult {
    pub location: StorageLocation,
    pub meta: EntryMeta,
    pub confirmation: Confirmation,
}

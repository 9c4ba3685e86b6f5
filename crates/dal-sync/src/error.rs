//! Error types for the synchronization crate.

use dal_block::BlockError;
use dal_storage::StorageError;
use dal_types::StorageLocation;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyncError {
    #[error("DataAccess must be initialized")]
    NotInitialized,

    #[error("already initialized")]
    AlreadyInitialized,

    #[error("IntervalTimer already started")]
    AlreadyStarted,

    #[error("can't stop IntervalTimer if it has not been started")]
    NotStarted,

    /// A historical entry could not be parsed while building the index.
    #[error("malformed entry at {location}: {source}")]
    MalformedEntry {
        location: StorageLocation,
        #[source]
        source: BlockError,
    },

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type SyncResult<T> = Result<T, SyncError>;

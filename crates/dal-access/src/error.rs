//! Error types for the data-access crate.

use dal_block::BlockError;
use dal_index::IndexError;
use dal_storage::StorageError;
use dal_sync::SyncError;

/// Errors surfaced by data-access operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    /// Malformed caller input.
    #[error("validation error: {0}")]
    Validation(String),

    #[error("DataAccess must be initialized")]
    NotInitialized,

    #[error("already initialized")]
    AlreadyInitialized,

    /// A write was attempted through a read-only facade.
    #[error("cannot persist a transaction through a read-only data access")]
    ReadOnly,

    #[error("block error: {0}")]
    Block(#[from] BlockError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("index error: {0}")]
    Index(#[from] IndexError),

    #[error("synchronization error: {0}")]
    Sync(SyncError),

    #[error("configuration error: {0}")]
    Config(String),

    /// A remote data access reported an error or could not be reached.
    #[error("remote error: {0}")]
    Remote(String),
}

impl From<SyncError> for AccessError {
    fn from(e: SyncError) -> Self {
        match e {
            SyncError::NotInitialized => Self::NotInitialized,
            SyncError::AlreadyInitialized => Self::AlreadyInitialized,
            SyncError::Storage(e) => Self::Storage(e),
            other => Self::Sync(other),
        }
    }
}

/// Convenience alias for data-access results.
pub type AccessResult<T> = Result<T, AccessError>;

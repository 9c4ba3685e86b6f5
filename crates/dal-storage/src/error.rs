use dal_types::StorageLocation;

/// Errors from durable-log operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// No entry exists at the requested location.
    #[error("no entry found at location {0}")]
    NotFound(StorageLocation),

    /// The location is not awaiting confirmation.
    #[error("location {0} is not awaiting confirmation")]
    NotPending(StorageLocation),

    /// The log refused the append.
    #[error("append failed: {0}")]
    AppendFailed(String),

    /// The backend cannot be reached.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

//! Error types for the index crate.

use dal_types::StorageLocation;

/// Errors that can occur during index lookups.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IndexError {
    /// A boundary check was requested for a location that was never
    /// recorded. Indicates the caller and the index are out of step.
    #[error("no timestamp recorded for location {0}")]
    UnknownTimestamp(StorageLocation),
}

/// Convenience alias for index results.
pub type IndexResult<T> = Result<T, IndexError>;

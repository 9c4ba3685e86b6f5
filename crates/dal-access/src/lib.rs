//! Data-access layer for a channel/topic-indexed ledger.
//!
//! Composes the block codec, the indices and the synchronization engine into
//! the read and write surfaces callers use, and bridges the gap between a
//! write being submitted and the durable log confirming it.
//!
//! # Key Types
//!
//! - [`DataAccess`] -- the full surface: initialize / close / reads / persist
//! - [`DataRead`] / [`DataWrite`] -- the two halves a facade is built from
//! - [`Indexer`] -- where confirmed data comes from; [`LocalIndexer`] is the in-process one
//! - [`PendingStore`] -- optimistic, not-yet-confirmed writes, one per channel
//! - [`DataAccessRead`] -- merges indexer results with pending writes
//! - [`StorageDataWrite`] / [`NoPersistDataWrite`] / [`ReadOnlyDataWrite`] -- writer variants
//! - [`CombinedDataAccess`] -- one reader plus one writer behind [`DataAccess`]
//! - [`DataAccessConfig`] -- synchronization and persistence settings, TOML-loadable
//!
//! # Lifecycle
//!
//! `initialize` brings up the reader, then the writer. `close` shuts them down
//! in the reverse order. Every other operation fails with
//! [`AccessError::NotInitialized`] outside that window.

pub mod combined;
pub mod config;
pub mod error;
pub mod local;
pub mod pending;
pub mod read;
pub mod result;
pub mod traits;
pub mod write;

pub use combined::CombinedDataAccess;
pub use config::DataAccessConfig;
pub use error::{AccessError, AccessResult};
pub use local::{local_data_access, LocalDataAccess, LocalDataWrite, LocalIndexer};
pub use pending::{PendingItem, PendingStore};
pub use read::DataAccessRead;
pub use result::{
    ChannelsByTopic, IndexedTransaction, Pagination, PaginationMeta, PersistedTransaction,
    TransactionsWithMeta,
};
pub use traits::{DataAccess, DataRead, DataWrite, Indexer};
pub use write::{NoPersistDataWrite, ReadOnlyDataWrite, StorageDataWrite};

//! Durable-log interface for the channel ledger data-access layer.
//!
//! The durable log (a blockchain plus a content-addressed blob store, or a
//! mock) is an external, eventually-confirmed append log. This crate defines
//! the narrow surface the data-access layer consumes and ships an in-memory
//! implementation for tests and embedding.
//!
//! # Key Types
//!
//! - [`Storage`] -- append / read / read_many / get_data
//! - [`AppendResult`] -- provisional location plus a one-shot [`Confirmation`]
//! - [`AppendOutcome`] -- `Confirmed(meta)` or `Failed(reason)`, delivered once
//! - [`InMemoryStorage`] -- content-addressed log with optional manual confirmation
//!
//! # Design Rules
//!
//! 1. Entries are immutable once appended; locations are content hashes.
//! 2. Every append resolves its confirmation at most once.
//! 3. `get_data` only surfaces confirmed entries.
//! 4. The store never interprets entry contents.

pub mod confirmation;
pub mod entry;
pub mod error;
pub mod memory;
pub mod traits;

pub use confirmation::{confirmation_channel, AppendOutcome, Confirmation, ConfirmationSender};
pub use entry::{AppendResult, StorageBatch, StorageEntry};
pub use error::{StorageError, StorageResult};
pub use memory::InMemoryStorage;
pub use traits::Storage;

//! Foundation types for the channel ledger data-access layer.
//!
//! This crate provides the identifier, payload, and temporal types shared by
//! every other `dal-*` crate.
//!
//! # Key Types
//!
//! - [`ChannelId`] -- Grouping key for the transactions of one logical entity
//! - [`Topic`] -- Secondary label used to discover channels
//! - [`StorageLocation`] -- Opaque handle returned by the durable log on append
//! - [`ContentHash`] -- Content-addressed identifier
//! - [`Transaction`] -- Opaque signed payload, clear or encrypted
//! - [`TimestampBoundaries`] -- Optional `[from, to]` filter in epoch seconds
//! - [`EntryMeta`] -- Timestamp and confirmation state of a durable-log entry
//! - [`TimestampedTransaction`] -- A transaction as reported by read operations

pub mod hash;
pub mod ids;
pub mod meta;
pub mod temporal;
pub mod transaction;

pub use hash::ContentHash;
pub use ids::{ChannelId, StorageLocation, Topic};
pub use meta::{ContentState, EntryMeta, TimestampedTransaction, TransactionState};
pub use temporal::{now_seconds, Timestamp, TimestampBoundaries};
pub use transaction::Transaction;

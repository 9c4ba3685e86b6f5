//! Synchronization engine for the channel ledger data-access layer.
//!
//! The [`Synchronizer`] keeps a [`TransactionIndex`](dal_index::TransactionIndex)
//! consistent with the durable log. `initialize` replays the whole log into a
//! fresh index and refuses any malformed entry; `synchronize_new_data_ids`
//! then pulls entries newer than the watermark, skipping malformed ones.
//!
//! # Key Types
//!
//! - [`Synchronizer`] -- not-initialized / initialized state machine over a `Storage`
//! - [`IntervalTimer`] -- runs a [`PeriodicTask`] on a fixed interval, never overlapping runs
//! - [`SyncConfig`] -- interval and failure-escalation threshold
//! - [`SyncStatus`] / [`SyncReport`] -- what has been indexed so far / by one pass

pub mod config;
pub mod error;
pub mod synchronizer;
pub mod timer;

pub use config::SyncConfig;
pub use error::{SyncError, SyncResult};
pub use synchronizer::{SyncReport, SyncStatus, Synchronizer};
pub use timer::{IntervalTimer, PeriodicTask};

//! In-memory indices over the durable log.
//!
//! Synchronization feeds every parsed block header into these structures so
//! that reads can resolve channel ids and topics to storage locations without
//! scanning the log.
//!
//! # Key Types
//!
//! - [`LocationByTopicIndex`] -- channel id -> locations, topic -> channel ids
//! - [`TimestampByLocationIndex`] -- location -> first-seen timestamp, plus the running maximum
//! - [`IgnoredLocationIndex`] -- locations skipped during synchronization, with the reason
//! - [`TransactionIndex`] -- shared handle combining the three behind one lock
//!
//! Entries are never removed; the indices only grow.

pub mod error;
pub mod ignored;
pub mod location_by_topic;
pub mod timestamp_by_location;
pub mod transaction_index;

pub use error::{IndexError, IndexResult};
pub use ignored::IgnoredLocationIndex;
pub use location_by_topic::LocationByTopicIndex;
pub use timestamp_by_location::TimestampByLocationIndex;
pub use transaction_index::{IndexCounts, TransactionIndex};

//! Block codec for the channel ledger data-access layer.
//!
//! A block is the unit appended to the durable log: an ordered batch of
//! transactions plus a header that maps every channel id to the positions of
//! its transactions and to the topics it is discoverable under.
//!
//! Blocks are values. [`Block::push_transaction`] returns a new block and
//! leaves the receiver untouched, so stale references stay valid while
//! indices are updated elsewhere.
//!
//! # Persisted layout
//!
//! ```json
//! { "header": { "version": "0.1.0",
//!               "channelIds": { "<channel>": [0] },
//!               "topics": { "<channel>": ["<topic>", "<transaction hash>"] } },
//!   "transactions": [ { "data": "..." } ] }
//! ```

pub mod block;
pub mod codec;
pub mod error;

pub use block::{Block, BlockHeader, BLOCK_VERSION};
pub use error::{BlockError, BlockResult};

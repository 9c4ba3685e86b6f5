//! Content hashing for the channel ledger data-access layer.
//!
//! Provides domain-separated BLAKE3 hashing. Transactions are hashed over
//! their canonical JSON form; the hash doubles as the implicit topic every
//! transaction is indexed under. Blocks are hashed over their serialized
//! bytes by content-addressed logs.
//!
//! All crypto operations wrap established libraries; there is no custom cryptography.

pub mod hasher;

pub use hasher::{ContentHasher, HasherError};

use dal_types::{ContentHash, Transaction};

/// Canonical hash of a transaction.
pub fn transaction_hash(transaction: &Transaction) -> Result<ContentHash, HasherError> {
    ContentHasher::TRANSACTION.hash_json(transaction)
}

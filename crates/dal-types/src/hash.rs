use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ids::{StorageLocation, Topic};

/// Content-addressed identifier for a transaction or a serialized block.
///
/// Produced by `dal_crypto::ContentHasher`. Identical content always produces
/// the same hash, which is what deduplication and the implicit
/// per-transaction topic rely on.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Wrap a digest computed by a domain-separated hasher.
    pub fn from_hash(hash: [u8; 32]) -> Self {
        Self(hash)
    }

    /// Hex-encoded string representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short hex representation (first 8 characters).
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// The hash rendered as a topic, so content is discoverable by its own hash.
    pub fn to_topic(&self) -> Topic {
        Topic::new(self.to_hex())
    }

    /// The hash rendered as a storage location (content-addressed logs).
    pub fn to_location(&self) -> StorageLocation {
        StorageLocation::new(self.to_hex())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", self.short_hex())
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_is_lowercase_and_full_length() {
        let hash = ContentHash::from_hash([0xab; 32]);
        assert_eq!(hash.to_hex(), "ab".repeat(32));
        assert_eq!(hash.to_string(), hash.to_hex());
    }

    #[test]
    fn debug_shows_short_prefix() {
        let hash = ContentHash::from_hash([0x01; 32]);
        assert_eq!(format!("{hash:?}"), "ContentHash(01010101)");
    }

    #[test]
    fn topic_and_location_use_full_hex() {
        let hash = ContentHash::from_hash([7; 32]);
        assert_eq!(hash.to_topic().as_str(), hash.to_hex());
        assert_eq!(hash.to_location().as_str(), hash.to_hex());
        assert_eq!(hash.to_hex().len(), 64);
    }
}

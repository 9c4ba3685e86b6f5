use dal_types::ContentHash;

/// BLAKE3 hasher bound to a domain tag.
///
/// The tag is fed to BLAKE3 ahead of the content, so the same bytes hashed
/// as a transaction and as a block give unrelated hashes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Transactions, over their JSON encoding.
    pub const TRANSACTION: Self = Self::with_domain("dal-transaction-v1");
    /// Serialized blocks, as appended to a content-addressed log.
    pub const BLOCK: Self = Self::with_domain("dal-block-v1");

    const fn with_domain(domain: &'static str) -> Self {
        Self { domain }
    }

    pub fn hash(&self, data: &[u8]) -> ContentHash {
        let digest = blake3::Hasher::new()
            .update(self.domain.as_bytes())
            .update(b":")
            .update(data)
            .finalize();
        ContentHash::from_hash(*digest.as_bytes())
    }

    /// Hash the JSON encoding of `value`.
    ///
    /// Derived `Serialize` impls emit fields in declaration order and skip
    /// absent optionals, so equal values always encode to equal bytes.
    pub fn hash_json<T: serde::Serialize>(&self, value: &T) -> Result<ContentHash, HasherError> {
        let encoded =
            serde_json::to_vec(value).map_err(|e| HasherError::Serialization(e.to_string()))?;
        Ok(self.hash(&encoded))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HasherError {
    #[error("cannot encode value for hashing: {0}")]
    Serialization(String),
}

//! Error types for the block codec.

use dal_crypto::HasherError;
use dal_types::ChannelId;

/// Errors produced while building or parsing blocks.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BlockError {
    /// A transaction without `data` or `encryptedData` was pushed.
    #[error("the transaction is missing the data property or encryptedData property")]
    MissingPayload,

    /// The serialized form is not JSON.
    #[error("impossible to JSON parse the data: {0}")]
    InvalidJson(String),

    /// A required field of the block layout is absent.
    #[error("data do not follow the block standard: missing `{0}`")]
    MissingField(&'static str),

    /// The header declares a version this codec cannot read.
    #[error("version not supported: {0}")]
    UnsupportedVersion(String),

    /// A transaction of a parsed block carries no payload.
    #[error("transaction at position {position} has no data or encryptedData")]
    TransactionWithoutPayload { position: usize },

    /// The header points a channel at a transaction the block does not hold.
    #[error("channel {channel_id} refers to position {position} but the block holds {count} transactions")]
    PositionOutOfRange {
        channel_id: ChannelId,
        position: usize,
        count: usize,
    },

    /// The document has the right fields but the wrong shape.
    #[error("malformed block: {0}")]
    Malformed(String),

    /// Hashing a transaction failed.
    #[error("hash error: {0}")]
    Hash(#[from] HasherError),

    /// Serializing the block failed.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl BlockError {
    /// Returns `true` for errors caused by remote data not matching the block
    /// layout, as opposed to caller input.
    pub fn is_format_error(&self) -> bool {
        !matches!(
            self,
            Self::MissingPayload | Self::Hash(_) | Self::Serialization(_)
        )
    }
}

/// Convenience alias for block results.
pub type BlockResult<T> = Result<T, BlockError>;

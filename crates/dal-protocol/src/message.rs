use dal_access::{ChannelsByTopic, TransactionsWithMeta};
use dal_types::{ChannelId, EntryMeta, StorageLocation, TimestampBoundaries, Topic, Transaction};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// A message that can travel in a frame.
pub trait WireMessage: Serialize + DeserializeOwned {
    fn type_tag(&self) -> u8;
    fn type_name(&self) -> &'static str;
    /// Whether `tag` names a variant of this message type.
    fn is_known_tag(tag: u8) -> bool;
}

/// Requests a client sends to a remote data access.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataAccessRequest {
    GetTransactionsByChannelId {
        channel_id: ChannelId,
        boundaries: Option<TimestampBoundaries>,
    },
    GetChannelsByTopic {
        topic: Topic,
        boundaries: Option<TimestampBoundaries>,
        page: Option<usize>,
        page_size: Option<usize>,
    },
    GetChannelsByMultipleTopics {
        topics: Vec<Topic>,
        boundaries: Option<TimestampBoundaries>,
        page: Option<usize>,
        page_size: Option<usize>,
    },
    PersistTransaction {
        transaction: Transaction,
        channel_id: ChannelId,
        topics: Vec<Topic>,
    },
    /// Hex-encoded transaction hash.
    GetConfirmedTransaction { transaction_hash: String },
}

/// Responses a remote data access sends back.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataAccessResponse {
    Transactions(TransactionsWithMeta),
    Channels(ChannelsByTopic),
    Persisted {
        location: StorageLocation,
        meta: EntryMeta,
        topics: Vec<Topic>,
    },
    Confirmed {
        location: StorageLocation,
        meta: EntryMeta,
    },
    Error { code: u32, message: String },
}

impl DataAccessRequest {
    /// Route of the request on an HTTP node.
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::GetTransactionsByChannelId { .. } => endpoints::TRANSACTIONS_BY_CHANNEL_ID,
            Self::GetChannelsByTopic { .. } => endpoints::CHANNELS_BY_TOPIC,
            Self::GetChannelsByMultipleTopics { .. } => endpoints::CHANNELS_BY_MULTIPLE_TOPICS,
            Self::PersistTransaction { .. } => endpoints::PERSIST_TRANSACTION,
            Self::GetConfirmedTransaction { .. } => endpoints::CONFIRMED_TRANSACTION,
        }
    }
}

impl WireMessage for DataAccessRequest {
    fn type_tag(&self) -> u8 {
        match self {
            Self::GetTransactionsByChannelId { .. } => 1,
            Self::GetChannelsByTopic { .. } => 2,
            Self::GetChannelsByMultipleTopics { .. } => 3,
            Self::PersistTransaction { .. } => 4,
            Self::GetConfirmedTransaction { .. } => 5,
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            Self::GetTransactionsByChannelId { .. } => "GetTransactionsByChannelId",
            Self::GetChannelsByTopic { .. } => "GetChannelsByTopic",
            Self::GetChannelsByMultipleTopics { .. } => "GetChannelsByMultipleTopics",
            Self::PersistTransaction { .. } => "PersistTransaction",
            Self::GetConfirmedTransaction { .. } => "GetConfirmedTransaction",
        }
    }

    fn is_known_tag(tag: u8) -> bool {
        (1..=5).contains(&tag)
    }
}

impl WireMessage for DataAccessResponse {
    fn type_tag(&self) -> u8 {
        match self {
            Self::Transactions(_) => 16,
            Self::Channels(_) => 17,
            Self::Persisted { .. } => 18,
            Self::Confirmed { .. } => 19,
            Self::Error { .. } => 255,
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            Self::Transactions(_) => "Transactions",
            Self::Channels(_) => "Channels",
            Self::Persisted { .. } => "Persisted",
            Self::Confirmed { .. } => "Confirmed",
            Self::Error { .. } => "Error",
        }
    }

    fn is_known_tag(tag: u8) -> bool {
        (16..=19).contains(&tag) || tag == 255
    }
}

/// HTTP routes of a data-access node.
pub mod endpoints {
    pub const TRANSACTIONS_BY_CHANNEL_ID: &str = "/getTransactionsByChannelId";
    pub const CHANNELS_BY_TOPIC: &str = "/getChannelsByTopic";
    pub const CHANNELS_BY_MULTIPLE_TOPICS: &str = "/getChannelsByMultipleTopics";
    pub const PERSIST_TRANSACTION: &str = "/persistTransaction";
    pub const CONFIRMED_TRANSACTION: &str = "/getConfirmedTransaction";
}

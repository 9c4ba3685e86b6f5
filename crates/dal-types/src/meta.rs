use std::fmt;

use serde::{Deserialize, Serialize};

use crate::temporal::Timestamp;
use crate::transaction::Transaction;

/// Confirmation state of an entry as reported by the durable log.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentState {
    /// Appended but not yet confirmed by the log.
    Pending,
    /// Durably confirmed.
    Confirmed,
}

impl fmt::Display for ContentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Confirmed => write!(f, "confirmed"),
        }
    }
}

/// Metadata the durable log attaches to every entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryMeta {
    pub timestamp: Timestamp,
    pub state: ContentState,
}

impl EntryMeta {
    pub fn confirmed(timestamp: Timestamp) -> Self {
        Self {
            timestamp,
            state: ContentState::Confirmed,
        }
    }

    pub fn pending(timestamp: Timestamp) -> Self {
        Self {
            timestamp,
            state: ContentState::Pending,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        self.state == ContentState::Confirmed
    }
}

/// State of a transaction as reported to readers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionState {
    Pending,
    Confirmed,
}

impl From<ContentState> for TransactionState {
    fn from(state: ContentState) -> Self {
        match state {
            ContentState::Pending => Self::Pending,
            ContentState::Confirmed => Self::Confirmed,
        }
    }
}

/// A transaction together with its state and the time it was first seen.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimestampedTransaction {
    pub state: TransactionState,
    pub timestamp: Timestamp,
    pub transaction: Transaction,
}

impl TimestampedTransaction {
    pub fn confirmed(transaction: Transaction, timestamp: Timestamp) -> Self {
        Self {
            state: TransactionState::Confirmed,
            timestamp,
            transaction,
        }
    }

    pub fn pending(transaction: Transaction, timestamp: Timestamp) -> Self {
        Self {
            state: TransactionState::Pending,
            timestamp,
            transaction,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_state_maps_to_transaction_state() {
        assert_eq!(
            TransactionState::from(ContentState::Confirmed),
            TransactionState::Confirmed
        );
        assert_eq!(
            TransactionState::from(ContentState::Pending),
            TransactionState::Pending
        );
    }

    #[test]
    fn states_serialize_lowercase() {
        let meta = EntryMeta::confirmed(10);
        let json = serde_json::to_string(&meta).unwrap();
        assert_eq!(json, r#"{"timestamp":10,"state":"confirmed"}"#);
        assert!(meta.is_confirmed());
        assert!(!EntryMeta::pending(10).is_confirmed());
    }
}

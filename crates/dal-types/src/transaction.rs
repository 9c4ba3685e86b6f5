use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// An opaque transaction payload.
///
/// The data-access layer never interprets the contents. A transaction is
/// either clear (`data`) or encrypted (`encrypted_data` with its method and
/// per-recipient `keys`). Field names follow the persisted block layout.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted_data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encryption_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keys: Option<BTreeMap<String, String>>,
}

impl Transaction {
    /// A clear transaction carrying `data`.
    pub fn from_data(data: impl Into<String>) -> Self {
        Self {
            data: Some(data.into()),
            ..Self::default()
        }
    }

    /// An encrypted transaction.
    pub fn encrypted(
        encrypted_data: impl Into<String>,
        encryption_method: impl Into<String>,
        keys: BTreeMap<String, String>,
    ) -> Self {
        Self {
            data: None,
            encrypted_data: Some(encrypted_data.into()),
            encryption_method: Some(encryption_method.into()),
            keys: Some(keys),
        }
    }

    /// Returns `true` if the transaction carries a clear or encrypted payload.
    pub fn has_payload(&self) -> bool {
        self.data.is_some() || self.encrypted_data.as_deref().is_some_and(|d| !d.is_empty())
    }

    /// Returns `true` for encrypted transactions.
    pub fn is_encrypted(&self) -> bool {
        self.encrypted_data.is_some()
    }
}

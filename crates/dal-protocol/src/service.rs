//! Server side of the protocol.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use dal_access::{AccessError, AccessResult, DataAccess};
use dal_block::BlockError;
use dal_crypto::transaction_hash;
use dal_storage::{AppendOutcome, Confirmation};
use dal_types::{EntryMeta, StorageLocation};
use tracing::{debug, warn};

use crate::codec::DalCodec;
use crate::error::{code_for, codes, ProtocolResult};
use crate::message::{DataAccessRequest, DataAccessResponse, WireMessage};
use crate::transport::RemoteTransport;

/// Outcome of a write, as remembered by the dispatcher.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfirmationRecord {
    Confirmed {
        location: StorageLocation,
        meta: EntryMeta,
    },
    Failed(String),
}

/// Outcomes kept for writes nobody has polled yet.
pub const DEFAULT_MAX_CONFIRMATION_RECORDS: usize = 10_000;

/// Write outcomes awaiting a poll, oldest first.
#[derive(Debug)]
struct ConfirmationLog {
    records: HashMap<String, ConfirmationRecord>,
    order: VecDeque<String>,
    capacity: usize,
}

impl ConfirmationLog {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            records: HashMap::new(),
            order: VecDeque::new(),
            capacity,
        }
    }

    fn insert(&mut self, transaction_hash: String, record: ConfirmationRecord) {
        if self.records.insert(transaction_hash.clone(), record).is_some() {
            self.order.retain(|h| h != &transaction_hash);
        }
        self.order.push_back(transaction_hash);
        while self.records.len() > self.capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.records.remove(&oldest);
            debug!(transaction_hash = %oldest, "unpolled write outcome dropped");
        }
    }

    fn take(&mut self, transaction_hash: &str) -> Option<ConfirmationRecord> {
        let record = self.records.remove(transaction_hash)?;
        self.order.retain(|h| h != transaction_hash);
        Some(record)
    }
}

type Confirmations = Arc<RwLock<ConfirmationLog>>;

/// Routes decoded requests to a [`DataAccess`].
///
/// Writes are tracked by transaction hash so clients can poll for their
/// confirmation with `GetConfirmedTransaction`. A record is handed out once
/// and then forgotten; records never polled are dropped oldest first past
/// the capacity.
pub struct DataAccessService<A> {
    access: Arc<A>,
    confirmations: Confirmations,
}

impl<A: DataAccess + 'static> DataAccessService<A> {
    pub fn new(access: Arc<A>) -> Self {
        Self::with_capacity(access, DEFAULT_MAX_CONFIRMATION_RECORDS)
    }

    pub fn with_capacity(access: Arc<A>, max_confirmation_records: usize) -> Self {
        Self {
            access,
            confirmations: Arc::new(RwLock::new(ConfirmationLog::with_capacity(
                max_confirmation_records,
            ))),
        }
    }

    pub fn access(&self) -> &Arc<A> {
        &self.access
    }

    /// What is known about the write with this hex transaction hash.
    pub fn confirmation(&self, transaction_hash: &str) -> Option<ConfirmationRecord> {
        self.confirmations
            .read()
            .expect("lock poisoned")
            .records
            .get(transaction_hash)
            .cloned()
    }

    /// Number of outcomes waiting to be polled.
    pub fn pending_confirmations(&self) -> usize {
        self.confirmations.read().expect("lock poisoned").records.len()
    }

    fn take_confirmation(&self, transaction_hash: &str) -> Option<ConfirmationRecord> {
        self.confirmations
            .write()
            .expect("lock poisoned")
            .take(transaction_hash)
    }

    /// Decode a request frame, dispatch it, and encode the response frame.
    pub async fn handle_frame(&self, frame: &[u8]) -> ProtocolResult<Vec<u8>> {
        let (request, _) = DalCodec::decode::<DataAccessRequest>(frame)?;
        let response = self.handle(request).await;
        DalCodec::encode(&response)
    }

    /// Dispatch one request. Failures are reported as
    /// [`DataAccessResponse::Error`].
    pub async fn handle(&self, request: DataAccessRequest) -> DataAccessResponse {
        let name = request.type_name();
        match self.dispatch(request).await {
            Ok(response) => response,
            Err(e) => {
                let code = code_for(&e);
                if code == codes::INTERNAL {
                    warn!(request = name, error = %e, "request failed");
                } else {
                    debug!(request = name, error = %e, "request rejected");
                }
                DataAccessResponse::Error {
                    code,
                    message: e.to_string(),
                }
            }
        }
    }

    async fn dispatch(&self, request: DataAccessRequest) -> AccessResult<DataAccessResponse> {
        match request {
            DataAccessRequest::GetTransactionsByChannelId {
                channel_id,
                boundaries,
            } => Ok(DataAccessResponse::Transactions(
                self.access
                    .transactions_by_channel_id(&channel_id, boundaries)
                    .await?,
            )),
            DataAccessRequest::GetChannelsByTopic {
                topic,
                boundaries,
                page,
                page_size,
            } => Ok(DataAccessResponse::Channels(
                self.access
                    .channels_by_topic(&topic, boundaries, page, page_size)
                    .await?,
            )),
            DataAccessRequest::GetChannelsByMultipleTopics {
                topics,
                boundaries,
                page,
                page_size,
            } => Ok(DataAccessResponse::Channels(
                self.access
                    .channels_by_multiple_topics(&topics, boundaries, page, page_size)
                    .await?,
            )),
            DataAccessRequest::PersistTransaction {
                transaction,
                channel_id,
                topics,
            } => {
                let hash = transaction_hash(&transaction)
                    .map_err(|e| AccessError::Block(BlockError::from(e)))?
                    .to_hex();
                let persisted = self
                    .access
                    .persist_transaction(transaction, &channel_id, &topics)
                    .await?;
                tokio::spawn(record_confirmation(
                    Arc::clone(&self.confirmations),
                    hash,
                    persisted.confirmation,
                ));
                Ok(DataAccessResponse::Persisted {
                    location: persisted.location,
                    meta: persisted.meta,
                    topics: persisted.topics,
                })
            }
            DataAccessRequest::GetConfirmedTransaction { transaction_hash } => {
                Ok(match self.take_confirmation(&transaction_hash) {
                    Some(ConfirmationRecord::Confirmed { location, meta }) => {
                        DataAccessResponse::Confirmed { location, meta }
                    }
                    Some(ConfirmationRecord::Failed(reason)) => DataAccessResponse::Error {
                        code: codes::CONFIRMATION_FAILED,
                        message: reason,
                    },
                    None => DataAccessResponse::Error {
                        code: codes::NOT_FOUND,
                        message: format!("transaction {transaction_hash} is not confirmed"),
                    },
                })
            }
        }
    }
}

async fn record_confirmation(
    confirmations: Confirmations,
    transaction_hash: String,
    confirmation: Confirmation,
) {
    let location = confirmation.location().clone();
    let record = match confirmation.wait().await {
        AppendOutcome::Confirmed(meta) => ConfirmationRecord::Confirmed { location, meta },
        AppendOutcome::Failed(reason) => ConfirmationRecord::Failed(reason),
    };
    debug!(%transaction_hash, ?record, "write outcome recorded");
    confirmations
        .write()
        .expect("lock poisoned")
        .insert(transaction_hash, record);
}

#[async_trait]
impl<A: DataAccess + 'static> RemoteTransport for DataAccessService<A> {
    async fn round_trip(&self, frame: Vec<u8>) -> ProtocolResult<Vec<u8>> {
        self.handle_frame(&frame).await
    }
}

impl<A: DataAccess + 'static> std::fmt::Debug for DataAccessService<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataAccessService")
            .field("confirmations", &self.pending_confirmations())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dal_access::{local_data_access, DataAccessConfig, LocalDataAccess};
    use dal_storage::InMemoryStorage;
    use dal_types::{ChannelId, Topic, Transaction};

    async fn service(
        storage: Arc<InMemoryStorage>,
    ) -> DataAccessService<LocalDataAccess<InMemoryStorage>> {
        let access = local_data_access(storage, &DataAccessConfig::default());
        access.initialize().await.unwrap();
        DataAccessService::new(Arc::new(access))
    }

    /// Let spawned recorders observe outcomes.
    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    fn hash_of(transaction: &Transaction) -> String {
        transaction_hash(transaction).unwrap().to_hex()
    }

    #[tokio::test]
    async fn persist_then_confirmation_is_recorded() {
        let storage = Arc::new(InMemoryStorage::with_manual_confirmation());
        let service = service(Arc::clone(&storage)).await;
        let tx = Transaction::from_data("x");

        let response = service
            .handle(DataAccessRequest::PersistTransaction {
                transaction: tx.clone(),
                channel_id: ChannelId::from("c1"),
                topics: vec![Topic::from("t1")],
            })
            .await;
        let DataAccessResponse::Persisted { location, .. } = response else {
            panic!("expected Persisted");
        };

        let lookup = DataAccessRequest::GetConfirmedTransaction {
            transaction_hash: hash_of(&tx),
        };
        assert!(matches!(
            service.handle(lookup.clone()).await,
            DataAccessResponse::Error { code: codes::NOT_FOUND, .. }
        ));

        storage.confirm(&location, 77).unwrap();
        settle().await;
        assert_eq!(service.pending_confirmations(), 1);
        assert_eq!(
            service.handle(lookup.clone()).await,
            DataAccessResponse::Confirmed {
                location,
                meta: EntryMeta::confirmed(77)
            }
        );

        // Handed out once, then forgotten.
        assert_eq!(service.pending_confirmations(), 0);
        assert!(matches!(
            service.handle(lookup).await,
            DataAccessResponse::Error { code: codes::NOT_FOUND, .. }
        ));
    }

    #[tokio::test]
    async fn unpolled_outcomes_are_bounded() {
        let storage = Arc::new(InMemoryStorage::new());
        let access = local_data_access(storage, &DataAccessConfig::default());
        access.initialize().await.unwrap();
        let service = DataAccessService::with_capacity(Arc::new(access), 2);

        let txs: Vec<Transaction> = ["a", "b", "c"]
            .iter()
            .map(|d| Transaction::from_data(*d))
            .collect();
        for (i, tx) in txs.iter().enumerate() {
            service
                .handle(DataAccessRequest::PersistTransaction {
                    transaction: tx.clone(),
                    channel_id: ChannelId::from(format!("c{i}")),
                    topics: vec![],
                })
                .await;
            settle().await;
        }

        assert_eq!(service.pending_confirmations(), 2);
        assert!(service.confirmation(&hash_of(&txs[0])).is_none());
        assert!(service.confirmation(&hash_of(&txs[2])).is_some());
    }

    #[tokio::test]
    async fn failed_write_is_reported_as_failed() {
        let storage = Arc::new(InMemoryStorage::with_manual_confirmation());
        let service = service(Arc::clone(&storage)).await;
        let tx = Transaction::from_data("doomed");

        let DataAccessResponse::Persisted { location, .. } = service
            .handle(DataAccessRequest::PersistTransaction {
                transaction: tx.clone(),
                channel_id: ChannelId::from("c1"),
                topics: vec![],
            })
            .await
        else {
            panic!("expected Persisted");
        };
        storage.fail(&location, "rejected").unwrap();
        settle().await;

        assert_eq!(
            service.confirmation(&hash_of(&tx)),
            Some(ConfirmationRecord::Failed("rejected".into()))
        );
        assert!(matches!(
            service
                .handle(DataAccessRequest::GetConfirmedTransaction {
                    transaction_hash: hash_of(&tx),
                })
                .await,
            DataAccessResponse::Error { code: codes::CONFIRMATION_FAILED, .. }
        ));
        assert!(service.confirmation(&hash_of(&tx)).is_none());
    }

    #[tokio::test]
    async fn access_errors_are_encoded_with_codes() {
        let storage = Arc::new(InMemoryStorage::new());
        let service = service(storage).await;

        let response = service
            .handle(DataAccessRequest::GetChannelsByTopic {
                topic: Topic::from("t1"),
                boundaries: None,
                page: Some(0),
                page_size: Some(1),
            })
            .await;
        assert!(matches!(
            response,
            DataAccessResponse::Error { code: codes::VALIDATION, .. }
        ));

        let response = service
            .handle(DataAccessRequest::PersistTransaction {
                transaction: Transaction::default(),
                channel_id: ChannelId::from("c1"),
                topics: vec![],
            })
            .await;
        assert!(matches!(
            response,
            DataAccessResponse::Error { code: codes::VALIDATION, .. }
        ));
    }

    #[tokio::test]
    async fn uninitialized_access_reports_not_initialized() {
        let storage = Arc::new(InMemoryStorage::new());
        let access = local_data_access(storage, &DataAccessConfig::default());
        let service = DataAccessService::new(Arc::new(access));
        let response = service
            .handle(DataAccessRequest::GetTransactionsByChannelId {
                channel_id: ChannelId::from("c1"),
                boundaries: None,
            })
            .await;
        assert!(matches!(
            response,
            DataAccessResponse::Error { code: codes::NOT_INITIALIZED, .. }
        ));
    }

    #[tokio::test]
    async fn frames_round_trip_through_the_service() {
        let storage = Arc::new(InMemoryStorage::new());
        let service = service(storage).await;
        let request = DataAccessRequest::GetTransactionsByChannelId {
            channel_id: ChannelId::from("c1"),
            boundaries: None,
        };
        let reply = service
            .round_trip(DalCodec::encode(&request).unwrap())
            .await
            .unwrap();
        let (response, _) = DalCodec::decode::<DataAccessResponse>(&reply).unwrap();
        assert_eq!(
            response,
            DataAccessResponse::Transactions(Default::default())
        );
    }
}

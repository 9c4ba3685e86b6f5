//! Client side of the protocol.

use std::sync::Arc;

use async_trait::async_trait;
use dal_access::{
    AccessError, AccessResult, ChannelsByTopic, DataAccess, PersistedTransaction,
    TransactionsWithMeta,
};
use dal_block::BlockError;
use dal_crypto::transaction_hash;
use dal_storage::{confirmation_channel, ConfirmationSender};
use dal_types::{ChannelId, TimestampBoundaries, Topic, Transaction};
use tracing::{debug, warn};

use crate::codec::DalCodec;
use crate::config::RemoteConfig;
use crate::error::{codes, ProtocolError, ProtocolResult};
use crate::message::{DataAccessRequest, DataAccessResponse, WireMessage};
use crate::transport::RemoteTransport;

/// [`DataAccess`] backed by a remote node.
///
/// Reads are forwarded as-is. A persist returns as soon as the node has
/// appended the block; a background task then polls the node for the
/// confirmation and resolves the returned [`Confirmation`](dal_storage::Confirmation).
/// Initialization and shutdown of the node are its own business, so
/// `initialize` and `close` do nothing here.
pub struct RemoteDataAccess<T> {
    transport: Arc<T>,
    config: RemoteConfig,
}

impl<T: RemoteTransport> RemoteDataAccess<T> {
    pub fn new(transport: Arc<T>, config: RemoteConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }

    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// Send one request and decode the response. Error responses become
    /// [`ProtocolError::Remote`].
    pub async fn send(&self, request: &DataAccessRequest) -> ProtocolResult<DataAccessResponse> {
        send_request(self.transport.as_ref(), request).await
    }

    async fn channels(&self, request: DataAccessRequest) -> AccessResult<ChannelsByTopic> {
        match self.send(&request).await? {
            DataAccessResponse::Channels(channels) => Ok(channels),
            other => Err(unexpected(&request, &other).into()),
        }
    }
}

async fn send_request<T: RemoteTransport + ?Sized>(
    transport: &T,
    request: &DataAccessRequest,
) -> ProtocolResult<DataAccessResponse> {
    let frame = DalCodec::encode(request)?;
    debug!(
        endpoint = request.endpoint(),
        bytes = frame.len(),
        "sending request"
    );
    let reply = transport.round_trip(frame).await?;
    let (response, _) = DalCodec::decode::<DataAccessResponse>(&reply)?;
    match response {
        DataAccessResponse::Error { code, message } => Err(ProtocolError::Remote { code, message }),
        other => Ok(other),
    }
}

fn unexpected(request: &DataAccessRequest, received: &DataAccessResponse) -> ProtocolError {
    ProtocolError::UnexpectedResponse {
        request: request.type_name(),
        received: received.type_name(),
    }
}

/// Poll the node until it reports the outcome of the write identified by
/// `transaction_hash`, then resolve `sender`.
async fn await_confirmation<T: RemoteTransport>(
    transport: Arc<T>,
    config: RemoteConfig,
    transaction_hash: String,
    sender: ConfirmationSender,
) {
    tokio::time::sleep(config.defer()).await;

    let request = DataAccessRequest::GetConfirmedTransaction {
        transaction_hash: transaction_hash.clone(),
    };
    let attempts = config.attempts();
    let mut last_error: Option<String> = None;
    for attempt in 0..attempts {
        if attempt > 0 {
            tokio::time::sleep(config.retry_delay()).await;
        }
        match send_request(transport.as_ref(), &request).await {
            Ok(DataAccessResponse::Confirmed { meta, .. }) => {
                debug!(%transaction_hash, attempt, "confirmation received");
                sender.confirm(meta);
                return;
            }
            Ok(other) => last_error = Some(unexpected(&request, &other).to_string()),
            Err(ProtocolError::Remote {
                code: codes::NOT_FOUND,
                ..
            }) => {}
            Err(ProtocolError::Remote {
                code: codes::CONFIRMATION_FAILED,
                message,
            }) => {
                sender.fail(message);
                return;
            }
            Err(e) => {
                warn!(%transaction_hash, attempt, error = %e, "confirmation request failed");
                last_error = Some(e.to_string());
            }
        }
    }

    let mut reason = format!(
        "transaction confirmation not received after {attempts} attempts \
         (defer {}ms, retry delay {}ms); poll transactions_by_channel_id until it is confirmed",
        config.confirmation_defer_ms, config.confirmation_retry_delay_ms
    );
    if let Some(e) = last_error {
        reason.push_str(&format!("; last error: {e}"));
    }
    warn!(%transaction_hash, "giving up on confirmation");
    sender.fail(reason);
}

#[async_trait]
impl<T: RemoteTransport> DataAccess for RemoteDataAccess<T> {
    async fn initialize(&self) -> AccessResult<()> {
        Ok(())
    }

    async fn close(&self) -> AccessResult<()> {
        Ok(())
    }

    async fn transactions_by_channel_id(
        &self,
        channel_id: &ChannelId,
        boundaries: Option<TimestampBoundaries>,
    ) -> AccessResult<TransactionsWithMeta> {
        let request = DataAccessRequest::GetTransactionsByChannelId {
            channel_id: channel_id.clone(),
            boundaries,
        };
        match self.send(&request).await? {
            DataAccessResponse::Transactions(transactions) => Ok(transactions),
            other => Err(unexpected(&request, &other).into()),
        }
    }

    async fn channels_by_topic(
        &self,
        topic: &Topic,
        boundaries: Option<TimestampBoundaries>,
        page: Option<usize>,
        page_size: Option<usize>,
    ) -> AccessResult<ChannelsByTopic> {
        self.channels(DataAccessRequest::GetChannelsByTopic {
            topic: topic.clone(),
            boundaries,
            page,
            page_size,
        })
        .await
    }

    async fn channels_by_multiple_topics(
        &self,
        topics: &[Topic],
        boundaries: Option<TimestampBoundaries>,
        page: Option<usize>,
        page_size: Option<usize>,
    ) -> AccessResult<ChannelsByTopic> {
        self.channels(DataAccessRequest::GetChannelsByMultipleTopics {
            topics: topics.to_vec(),
            boundaries,
            page,
            page_size,
        })
        .await
    }

    async fn persist_transaction(
        &self,
        transaction: Transaction,
        channel_id: &ChannelId,
        topics: &[Topic],
    ) -> AccessResult<PersistedTransaction> {
        let hash = transaction_hash(&transaction)
            .map_err(|e| AccessError::Block(BlockError::from(e)))?
            .to_hex();
        // Not retried: a slow node could end up appending the block twice.
        let request = DataAccessRequest::PersistTransaction {
            transaction,
            channel_id: channel_id.clone(),
            topics: topics.to_vec(),
        };
        let (location, meta, topics) = match self.send(&request).await? {
            DataAccessResponse::Persisted {
                location,
                meta,
                topics,
            } => (location, meta, topics),
            other => return Err(unexpected(&request, &other).into()),
        };

        let (sender, confirmation) = confirmation_channel(location.clone());
        tokio::spawn(await_confirmation(
            Arc::clone(&self.transport),
            self.config.clone(),
            hash,
            sender,
        ));

        Ok(PersistedTransaction {
            location,
            meta,
            topics,
            confirmation,
        })
    }
}

impl<T> std::fmt::Debug for RemoteDataAccess<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteDataAccess")
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dal_storage::AppendOutcome;
    use dal_types::{EntryMeta, StorageLocation};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Answers each request with the next scripted response and records
    /// what it was sent.
    #[derive(Default)]
    struct ScriptedTransport {
        responses: Mutex<VecDeque<DataAccessResponse>>,
        sent: Mutex<Vec<DataAccessRequest>>,
    }

    impl ScriptedTransport {
        fn with(responses: Vec<DataAccessResponse>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                sent: Mutex::default(),
            })
        }

        fn sent(&self) -> Vec<DataAccessRequest> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RemoteTransport for ScriptedTransport {
        async fn round_trip(&self, frame: Vec<u8>) -> ProtocolResult<Vec<u8>> {
            let (request, _) = DalCodec::decode::<DataAccessRequest>(&frame)?;
            self.sent.lock().unwrap().push(request);
            let response = self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| ProtocolError::Transport("script exhausted".into()))?;
            DalCodec::encode(&response)
        }
    }

    fn not_found() -> DataAccessResponse {
        DataAccessResponse::Error {
            code: codes::NOT_FOUND,
            message: "not confirmed yet".into(),
        }
    }

    fn persisted() -> DataAccessResponse {
        DataAccessResponse::Persisted {
            location: StorageLocation::from("loc"),
            meta: EntryMeta::pending(5),
            topics: vec![Topic::from("t1")],
        }
    }

    fn config(max_retries: u32) -> RemoteConfig {
        RemoteConfig {
            confirmation_defer_ms: 1_000,
            confirmation_max_retries: max_retries,
            confirmation_retry_delay_ms: 500,
        }
    }

    #[tokio::test]
    async fn reads_are_forwarded() {
        let transport = ScriptedTransport::with(vec![DataAccessResponse::Transactions(
            TransactionsWithMeta::default(),
        )]);
        let remote = RemoteDataAccess::new(Arc::clone(&transport), RemoteConfig::default());
        let boundaries = Some(TimestampBoundaries::since(3));

        let result = remote
            .transactions_by_channel_id(&ChannelId::from("c1"), boundaries)
            .await
            .unwrap();
        assert!(result.is_empty());
        assert_eq!(
            transport.sent(),
            vec![DataAccessRequest::GetTransactionsByChannelId {
                channel_id: ChannelId::from("c1"),
                boundaries,
            }]
        );
    }

    #[tokio::test]
    async fn error_responses_become_access_errors() {
        let transport = ScriptedTransport::with(vec![DataAccessResponse::Error {
            code: codes::VALIDATION,
            message: "page size must be greater than 0".into(),
        }]);
        let remote = RemoteDataAccess::new(transport, RemoteConfig::default());
        assert_eq!(
            remote
                .channels_by_topic(&Topic::from("t1"), None, Some(1), Some(0))
                .await,
            Err(AccessError::Validation("page size must be greater than 0".into()))
        );
    }

    #[tokio::test]
    async fn wrong_response_kind_is_reported() {
        let transport = ScriptedTransport::with(vec![persisted()]);
        let remote = RemoteDataAccess::new(transport, RemoteConfig::default());
        assert!(matches!(
            remote.channels_by_topic(&Topic::from("t1"), None, None, None).await,
            Err(AccessError::Remote(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn persist_polls_until_confirmed() {
        let transport = ScriptedTransport::with(vec![
            persisted(),
            not_found(),
            not_found(),
            DataAccessResponse::Confirmed {
                location: StorageLocation::from("loc"),
                meta: EntryMeta::confirmed(8),
            },
        ]);
        let remote = RemoteDataAccess::new(Arc::clone(&transport), config(5));
        let tx = Transaction::from_data("x");

        let persisted = remote
            .persist_transaction(tx.clone(), &ChannelId::from("c1"), &[Topic::from("t1")])
            .await
            .unwrap();
        assert_eq!(persisted.location, StorageLocation::from("loc"));
        assert_eq!(persisted.meta, EntryMeta::pending(5));

        let started = tokio::time::Instant::now();
        assert_eq!(
            persisted.confirmation.wait().await,
            AppendOutcome::Confirmed(EntryMeta::confirmed(8))
        );
        // defer, then two retry delays
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(2_000));
        assert!(elapsed < Duration::from_millis(2_500));

        let expected_hash = transaction_hash(&tx).unwrap().to_hex();
        let sent = transport.sent();
        assert_eq!(sent.len(), 4);
        assert_eq!(
            sent[3],
            DataAccessRequest::GetConfirmedTransaction {
                transaction_hash: expected_hash
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn persist_gives_up_after_max_retries() {
        let transport = ScriptedTransport::with(vec![persisted(), not_found(), not_found()]);
        let remote = RemoteDataAccess::new(Arc::clone(&transport), config(1));

        let persisted = remote
            .persist_transaction(Transaction::from_data("x"), &ChannelId::from("c1"), &[])
            .await
            .unwrap();
        match persisted.confirmation.wait().await {
            AppendOutcome::Failed(reason) => assert!(reason.contains("after 2 attempts")),
            other => panic!("expected failure, got {other:?}"),
        }
        assert_eq!(transport.sent().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_write_on_node_fails_fast() {
        let transport = ScriptedTransport::with(vec![
            persisted(),
            DataAccessResponse::Error {
                code: codes::CONFIRMATION_FAILED,
                message: "out of gas".into(),
            },
        ]);
        let remote = RemoteDataAccess::new(Arc::clone(&transport), config(10));

        let persisted = remote
            .persist_transaction(Transaction::from_data("x"), &ChannelId::from("c1"), &[])
            .await
            .unwrap();
        assert_eq!(
            persisted.confirmation.wait().await,
            AppendOutcome::Failed("out of gas".into())
        );
        assert_eq!(transport.sent().len(), 2);
    }
}

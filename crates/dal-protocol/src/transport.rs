use async_trait::async_trait;

use crate::error::ProtocolResult;

/// Carries one encoded request frame to a node and returns the encoded
/// response frame.
///
/// This is where an HTTP or socket client plugs in. A
/// [`DataAccessService`](crate::DataAccessService) implements it directly,
/// which gives an in-process loopback.
#[async_trait]
pub trait RemoteTransport: Send + Sync + 'static {
    async fn round_trip(&self, frame: Vec<u8>) -> ProtocolResult<Vec<u8>>;
}

use async_trait::async_trait;
use medrelay_core::PushEvent;
use medrelay_sdk::RelayClient;
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("push transport unavailable: {0}")]
    Unavailable(String),
}

/// Capability-checked handle to the push channel.
///
/// Construction failure is an expected environment condition (no runtime
/// support, relay unreachable) and never propagates past the subscription.
#[async_trait]
pub trait PushTransport: Send + Sync {
    async fn connect(
        &self,
        origin: &str,
    ) -> Result<mpsc::UnboundedReceiver<PushEvent>, TransportError>;
}

/// Transport over the relay's WebSocket endpoint.
#[derive(Default)]
pub struct WebSocketTransport;

impl WebSocketTransport {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PushTransport for WebSocketTransport {
    async fn connect(
        &self,
        origin: &str,
    ) -> Result<mpsc::UnboundedReceiver<PushEvent>, TransportError> {
        RelayClient::new(origin)
            .connect_websocket()
            .await
            .map_err(|err| TransportError::Unavailable(err.to_string()))
    }
}

/// Null transport for environments without push support; the store then
/// degrades to REST-only operation.
#[derive(Default)]
pub struct NoopTransport;

impl NoopTransport {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PushTransport for NoopTransport {
    async fn connect(
        &self,
        _origin: &str,
    ) -> Result<mpsc::UnboundedReceiver<PushEvent>, TransportError> {
        Err(TransportError::Unavailable("push channel disabled".to_string()))
    }
}

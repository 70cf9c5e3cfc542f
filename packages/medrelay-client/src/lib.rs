pub mod store;
pub mod subscription;
pub mod transport;

pub use store::{NotificationStore, StoreNotice};
pub use subscription::{ChannelState, Subscription};
pub use transport::{NoopTransport, PushTransport, TransportError, WebSocketTransport};

pub const DEFAULT_ORIGIN: &str = "http://127.0.0.1:4000";

/// Relay origin for both the REST calls and the push channel, read from the
/// environment with a hardcoded fallback.
pub fn resolve_origin() -> String {
    std::env::var("MEDRELAY_API_URL").unwrap_or_else(|_| DEFAULT_ORIGIN.to_string())
}

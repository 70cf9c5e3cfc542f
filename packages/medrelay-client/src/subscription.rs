use crate::store::NotificationStore;
use crate::transport::PushTransport;
use medrelay_core::DEFAULT_EVENT_NAME;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Unconnected,
    Connecting,
    Connected,
}

/// Live push subscription owned by a UI context.
///
/// The connect attempt and the listen loop run as one task, so aborting the
/// task releases the channel even while the connect is still in flight.
/// Dropping the subscription releases it too, so remounts never leak open
/// channels.
pub struct Subscription {
    state: Arc<Mutex<ChannelState>>,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Best-effort connect. An unavailable transport settles the
    /// subscription in `Unconnected` without surfacing an error and without
    /// retrying; the store keeps working over REST alone.
    pub fn establish(
        transport: Arc<dyn PushTransport>,
        origin: &str,
        store: NotificationStore,
    ) -> Self {
        let state = Arc::new(Mutex::new(ChannelState::Connecting));
        let task_state = Arc::clone(&state);
        let origin = origin.to_string();

        let task = tokio::spawn(async move {
            let mut rx = match transport.connect(&origin).await {
                Ok(rx) => rx,
                Err(err) => {
                    debug!(error = %err, "push transport unavailable, staying unconnected");
                    *task_state.lock().unwrap() = ChannelState::Unconnected;
                    return;
                }
            };
            *task_state.lock().unwrap() = ChannelState::Connected;

            while let Some(event) = rx.recv().await {
                if event.event == DEFAULT_EVENT_NAME {
                    store.apply_push(&event.payload);
                }
            }

            *task_state.lock().unwrap() = ChannelState::Unconnected;
        });

        Self {
            state,
            task: Some(task),
        }
    }

    pub fn channel_state(&self) -> ChannelState {
        *self.state.lock().unwrap()
    }

    /// Releases the channel; safe to call while the connect is in flight.
    pub fn disconnect(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        *self.state.lock().unwrap() = ChannelState::Unconnected;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.disconnect();
    }
}

use medrelay_core::PushEvent;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Registry of connected subscriber channels.
///
/// Every emit is fanned out synchronously to every currently registered
/// subscriber; filtering by event name happens on the subscriber side. The
/// hub keeps no history, so a subscriber registered after an emit never
/// sees it. Delivery is fire-and-forget: a gone subscriber is pruned, never
/// reported back to the emitter.
pub(crate) struct BroadcastHub {
    subscribers: Mutex<HashMap<Uuid, mpsc::UnboundedSender<PushEvent>>>,
}

impl BroadcastHub {
    pub(crate) fn new() -> Self {
        Self {
            subscribers: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn register(&self) -> (Uuid, mpsc::UnboundedReceiver<PushEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();
        self.subscribers.lock().unwrap().insert(id, tx);
        info!(connection = %id, "subscriber connected");
        (id, rx)
    }

    pub(crate) fn unregister(&self, id: Uuid) {
        if self.subscribers.lock().unwrap().remove(&id).is_some() {
            info!(connection = %id, "subscriber disconnected");
        }
    }

    pub(crate) fn emit(&self, event: PushEvent) {
        let mut subscribers = self.subscribers.lock().unwrap();
        subscribers.retain(|id, tx| {
            if tx.send(event.clone()).is_ok() {
                true
            } else {
                warn!(connection = %id, "pruning subscriber with closed channel");
                false
            }
        });
    }

    pub(crate) fn subscriber_count(&self) -> usize {
        self.subscribers.lock().unwrap().len()
    }
}

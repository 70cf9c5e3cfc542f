use medrelay_core::{Notification, PayloadMap};
use medrelay_sdk::RelayClient;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing::debug;

// Fixed user-facing strings; response bodies are never surfaced.
const ERR_LOAD: &str = "Failed to load notifications";
const ERR_UPDATE: &str = "Failed to update notification";
const ERR_UPDATE_ALL: &str = "Failed to update notifications";
const ERR_DELETE: &str = "Failed to delete notification";
const OK_ALL_READ: &str = "All notifications marked as read";

/// Toast-style message for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreNotice {
    Error(String),
    Success(String),
}

struct StoreInner {
    notifications: Vec<Notification>,
    loading: bool,
}

/// Session-local reconciled notification view: a REST-fetched baseline plus
/// live-pushed deltas.
///
/// Mutations are optimistic and are not rolled back when the confirming
/// REST call fails; the list can disagree with the server until the next
/// `refresh`. A push arriving during an in-flight refresh races with the
/// list replacement; no ordering between the two is guaranteed.
#[derive(Clone)]
pub struct NotificationStore {
    client: RelayClient,
    inner: Arc<Mutex<StoreInner>>,
    notices: mpsc::UnboundedSender<StoreNotice>,
}

impl NotificationStore {
    pub fn new(base_url: &str) -> (Self, mpsc::UnboundedReceiver<StoreNotice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let store = Self {
            client: RelayClient::new(base_url),
            inner: Arc::new(Mutex::new(StoreInner {
                notifications: Vec::new(),
                loading: false,
            })),
            notices: tx,
        };
        (store, rx)
    }

    /// Replaces the whole list with the baseline fetch. On failure the list
    /// is left untouched and an error notice is emitted.
    pub async fn refresh(&self) {
        self.inner.lock().unwrap().loading = true;
        match self.client.fetch_notifications().await {
            Ok(notifications) => {
                let mut inner = self.inner.lock().unwrap();
                inner.notifications = notifications;
                inner.loading = false;
            }
            Err(err) => {
                debug!(error = %err, "baseline fetch failed");
                self.inner.lock().unwrap().loading = false;
                self.notify_error(ERR_LOAD);
            }
        }
    }

    /// Flips the flag locally before the server confirms; a failed
    /// confirmation surfaces an error but does not revert the flag.
    pub async fn mark_as_read(&self, id: &str) {
        {
            let mut inner = self.inner.lock().unwrap();
            if let Some(entry) = inner.notifications.iter_mut().find(|n| n.id == id) {
                entry.read = true;
            }
        }
        if let Err(err) = self.client.mark_read(id).await {
            debug!(error = %err, "mark-as-read confirmation failed");
            self.notify_error(ERR_UPDATE);
        }
    }

    pub async fn mark_all_as_read(&self) {
        {
            let mut inner = self.inner.lock().unwrap();
            for entry in inner.notifications.iter_mut() {
                entry.read = true;
            }
        }
        match self.client.mark_all_read().await {
            Ok(()) => self.notify_success(OK_ALL_READ),
            Err(err) => {
                debug!(error = %err, "mark-all-as-read confirmation failed");
                self.notify_error(ERR_UPDATE_ALL);
            }
        }
    }

    pub async fn delete_notification(&self, id: &str) {
        self.inner
            .lock()
            .unwrap()
            .notifications
            .retain(|n| n.id != id);
        if let Err(err) = self.client.delete_notification(id).await {
            debug!(error = %err, "delete confirmation failed");
            self.notify_error(ERR_DELETE);
        }
    }

    /// Prepends a pushed payload to the list. No dedup against existing ids
    /// and no coordination with an in-flight refresh.
    pub fn apply_push(&self, payload: &PayloadMap) {
        let notification = Notification::from_payload(payload);
        self.inner
            .lock()
            .unwrap()
            .notifications
            .insert(0, notification);
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.inner.lock().unwrap().notifications.clone()
    }

    /// Recomputed on every read, never stored.
    pub fn unread_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap()
            .notifications
            .iter()
            .filter(|n| !n.read)
            .count()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.lock().unwrap().loading
    }

    fn notify_error(&self, message: &str) {
        let _ = self.notices.send(StoreNotice::Error(message.to_string()));
    }

    fn notify_success(&self, message: &str) {
        let _ = self.notices.send(StoreNotice::Success(message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Json;
    use axum::http::StatusCode;
    use axum::routing::{delete, get, patch};
    use chrono::Utc;
    use medrelay_core::{FieldValue, NotificationKind};
    use std::net::SocketAddr;

    // Origin nothing listens on: REST calls fail fast with a refused
    // connection.
    const DEAD_ORIGIN: &str = "http://127.0.0.1:1";

    fn baseline_entry(id: &str, title: &str) -> Notification {
        Notification {
            id: id.to_string(),
            kind: NotificationKind::Appointment,
            title: title.to_string(),
            message: "baseline".to_string(),
            timestamp: Utc::now(),
            read: false,
            data: PayloadMap::new(),
        }
    }

    /// Stub of the external notification REST collaborators.
    async fn spawn_api_stub() -> SocketAddr {
        let baseline = vec![baseline_entry("a", "A"), baseline_entry("b", "B")];
        let app = axum::Router::new()
            .route(
                "/api/notifications",
                get(move || {
                    let baseline = baseline.clone();
                    async move { Json(serde_json::json!({ "notifications": baseline })) }
                }),
            )
            .route(
                "/api/notifications/read-all",
                patch(|| async { StatusCode::NO_CONTENT }),
            )
            .route(
                "/api/notifications/{id}/read",
                patch(|| async { StatusCode::NO_CONTENT }),
            )
            .route(
                "/api/notifications/{id}",
                delete(|| async { StatusCode::NO_CONTENT }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    fn push_payload(entries: &[(&str, &str)]) -> PayloadMap {
        entries
            .iter()
            .map(|(key, value)| (key.to_string(), FieldValue::Text(value.to_string())))
            .collect()
    }

    #[tokio::test]
    async fn test_refresh_replaces_list() {
        let addr = spawn_api_stub().await;
        let (store, _notices) = NotificationStore::new(&format!("http://{addr}"));

        store.refresh().await;

        let list = store.notifications();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].id, "a");
        assert_eq!(list[1].id, "b");
        assert!(!store.is_loading());
        assert_eq!(store.unread_count(), 2);
    }

    #[tokio::test]
    async fn test_refresh_failure_leaves_list_and_surfaces_error() {
        let (store, mut notices) = NotificationStore::new(DEAD_ORIGIN);
        store.apply_push(&push_payload(&[("id", "x"), ("title", "kept")]));

        store.refresh().await;

        assert_eq!(store.notifications().len(), 1);
        assert!(!store.is_loading());
        assert_eq!(
            notices.try_recv().unwrap(),
            StoreNotice::Error(ERR_LOAD.to_string())
        );
    }

    #[tokio::test]
    async fn test_push_prepends_normalized_notification() {
        let addr = spawn_api_stub().await;
        let (store, _notices) = NotificationStore::new(&format!("http://{addr}"));
        store.refresh().await;

        store.apply_push(&push_payload(&[("id", "x"), ("title", "T"), ("body", "M")]));

        let list = store.notifications();
        assert_eq!(list.len(), 3);
        assert_eq!(list[0].id, "x");
        assert_eq!(list[0].kind, NotificationKind::Info);
        assert_eq!(list[0].title, "T");
        assert_eq!(list[0].message, "M");
        assert!(!list[0].read);
        assert_eq!(list[1].id, "a");
        assert_eq!(list[2].id, "b");
        assert_eq!(store.unread_count(), 3);
    }

    #[tokio::test]
    async fn test_unread_count_tracks_every_mutation() {
        let addr = spawn_api_stub().await;
        let (store, mut notices) = NotificationStore::new(&format!("http://{addr}"));
        store.refresh().await;
        assert_eq!(store.unread_count(), 2);

        store.mark_as_read("a").await;
        assert_eq!(store.unread_count(), 1);

        store.apply_push(&push_payload(&[("id", "x")]));
        assert_eq!(store.unread_count(), 2);

        store.mark_all_as_read().await;
        assert_eq!(store.unread_count(), 0);
        assert_eq!(
            notices.try_recv().unwrap(),
            StoreNotice::Success(OK_ALL_READ.to_string())
        );

        store.delete_notification("x").await;
        assert_eq!(store.notifications().len(), 2);
        assert_eq!(store.unread_count(), 0);
    }

    #[tokio::test]
    async fn test_mark_as_read_is_not_rolled_back_on_failure() {
        let (store, mut notices) = NotificationStore::new(DEAD_ORIGIN);
        store.apply_push(&push_payload(&[("id", "x")]));

        store.mark_as_read("x").await;

        assert!(store.notifications()[0].read);
        assert_eq!(store.unread_count(), 0);
        assert_eq!(
            notices.try_recv().unwrap(),
            StoreNotice::Error(ERR_UPDATE.to_string())
        );
    }

    #[tokio::test]
    async fn test_delete_is_not_rolled_back_on_failure() {
        let (store, mut notices) = NotificationStore::new(DEAD_ORIGIN);
        store.apply_push(&push_payload(&[("id", "x")]));

        store.delete_notification("x").await;

        assert!(store.notifications().is_empty());
        assert_eq!(
            notices.try_recv().unwrap(),
            StoreNotice::Error(ERR_DELETE.to_string())
        );
    }

    #[tokio::test]
    async fn test_mark_all_failure_keeps_flags_and_surfaces_error() {
        let (store, mut notices) = NotificationStore::new(DEAD_ORIGIN);
        store.apply_push(&push_payload(&[("id", "x")]));
        store.apply_push(&push_payload(&[("id", "y")]));

        store.mark_all_as_read().await;

        assert_eq!(store.unread_count(), 0);
        assert_eq!(
            notices.try_recv().unwrap(),
            StoreNotice::Error(ERR_UPDATE_ALL.to_string())
        );
    }
}

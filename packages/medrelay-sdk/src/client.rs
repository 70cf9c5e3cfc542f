use crate::error::*;
use futures_util::{SinkExt, StreamExt};
use medrelay_core::{EmitAck, Notification, PushEvent};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::debug;
use url::Url;

#[derive(Debug, Deserialize)]
struct NotificationListResponse {
    notifications: Vec<Notification>,
}

/// Client for the relay's emit/health/push surface and for the external
/// notification REST collaborators, which live behind the same origin.
#[derive(Clone)]
pub struct RelayClient {
    client: Client,
    pub base_url: String,
    pub timeout: Duration,
}

impl RelayClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Submits an event for broadcast and returns the relay's echo of the
    /// resolved envelope.
    pub async fn emit(&self, event: &PushEvent) -> SdkResult<EmitAck> {
        let url = format!("{}/emit", self.base_url);
        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .json(event)
            .send()
            .await?;
        let ack = response.error_for_status()?.json::<EmitAck>().await?;
        Ok(ack)
    }

    pub async fn health(&self) -> SdkResult<()> {
        let url = format!("{}/health", self.base_url);
        let response = self.client.get(&url).timeout(self.timeout).send().await?;
        response.error_for_status()?;
        Ok(())
    }

    /// Baseline fetch of the server-authoritative notification list.
    pub async fn fetch_notifications(&self) -> SdkResult<Vec<Notification>> {
        let url = format!("{}/api/notifications", self.base_url);
        let response = self.client.get(&url).timeout(self.timeout).send().await?;
        let list = response
            .error_for_status()?
            .json::<NotificationListResponse>()
            .await?;
        Ok(list.notifications)
    }

    pub async fn mark_read(&self, id: &str) -> SdkResult<()> {
        let url = format!("{}/api/notifications/{}/read", self.base_url, id);
        let response = self.client.patch(&url).timeout(self.timeout).send().await?;
        response.error_for_status()?;
        Ok(())
    }

    pub async fn mark_all_read(&self) -> SdkResult<()> {
        let url = format!("{}/api/notifications/read-all", self.base_url);
        let response = self.client.patch(&url).timeout(self.timeout).send().await?;
        response.error_for_status()?;
        Ok(())
    }

    pub async fn delete_notification(&self, id: &str) -> SdkResult<()> {
        let url = format!("{}/api/notifications/{}", self.base_url, id);
        let response = self.client.delete(&url).timeout(self.timeout).send().await?;
        response.error_for_status()?;
        Ok(())
    }

    /// Derives the push-channel URL from the configured HTTP origin.
    pub fn websocket_url(&self) -> SdkResult<Url> {
        let mut url = Url::parse(&self.base_url)?;
        let scheme = match url.scheme() {
            "https" => "wss",
            _ => "ws",
        };
        url.set_scheme(scheme)
            .map_err(|_| SdkError::NetworkError(format!("cannot derive ws url from {}", self.base_url)))?;
        url.set_path("/ws");
        Ok(url)
    }

    /// Opens the push channel and returns a receiver of pushed events.
    ///
    /// Frames that do not parse as an event envelope are dropped silently.
    /// Dropping the receiver stops the reader task and releases the socket.
    pub async fn connect_websocket(&self) -> SdkResult<tokio::sync::mpsc::UnboundedReceiver<PushEvent>> {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let ws_url = self.websocket_url()?;

        match connect_async(ws_url.as_str()).await {
            Ok((ws_stream, _)) => {
                let (mut write, mut read) = ws_stream.split();

                tokio::spawn(async move {
                    loop {
                        tokio::select! {
                            // Receiver side is gone; stop reading and close
                            // the socket instead of waiting for the next
                            // inbound frame.
                            _ = tx.closed() => break,
                            msg = read.next() => {
                                match msg {
                                    Some(Ok(Message::Text(text))) => {
                                        match serde_json::from_str::<PushEvent>(&text) {
                                            Ok(event) => {
                                                if tx.send(event).is_err() {
                                                    break;
                                                }
                                            }
                                            Err(err) => {
                                                debug!(error = %err, "dropping unparseable push frame");
                                            }
                                        }
                                    }
                                    Some(Ok(Message::Binary(data))) => {
                                        if let Ok(text) = String::from_utf8(data.to_vec()) {
                                            if let Ok(event) = serde_json::from_str::<PushEvent>(&text) {
                                                if tx.send(event).is_err() {
                                                    break;
                                                }
                                            }
                                        }
                                    }
                                    Some(Ok(Message::Close(_))) | None => break,
                                    Some(Ok(Message::Ping(_))) => {
                                        if write.send(Message::Pong(vec![].into())).await.is_err() {
                                            break;
                                        }
                                    }
                                    Some(Err(err)) => {
                                        debug!(error = %err, "push channel read error");
                                        break;
                                    }
                                    Some(Ok(_)) => {}
                                }
                            }
                        }
                    }
                    let _ = write.close().await;
                });

                Ok(rx)
            }
            Err(e) => Err(SdkError::NetworkError(e.to_string())),
        }
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Notification category shown to the end user.
///
/// The set is closed on the wire: anything outside it deserializes as `Info`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotificationKind {
    Appointment,
    Message,
    Medication,
    Alert,
    #[default]
    Info,
}

impl NotificationKind {
    pub fn parse(text: &str) -> Self {
        match text {
            "appointment" => Self::Appointment,
            "message" => Self::Message,
            "medication" => Self::Medication,
            "alert" => Self::Alert,
            _ => Self::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Appointment => "appointment",
            Self::Message => "message",
            Self::Medication => "medication",
            Self::Alert => "alert",
            Self::Info => "info",
        }
    }
}

impl Serialize for NotificationKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for NotificationKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Ok(Self::parse(&text))
    }
}

/// A single auxiliary payload field.
///
/// Deliberately narrower than arbitrary JSON: payloads are opaque to the
/// relay but stay typed on this side of the wire. Values outside the union
/// (arrays, null) fail envelope deserialization, which the ingress absorbs
/// by substituting defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Number(f64),
    Text(String),
    Map(PayloadMap),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&PayloadMap> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }
}

/// Open string-keyed mapping carried by events and notifications.
pub type PayloadMap = BTreeMap<String, FieldValue>;

pub const DEFAULT_EVENT_NAME: &str = "notification";

fn default_event_name() -> String {
    DEFAULT_EVENT_NAME.to_string()
}

/// Wire frame for both the emit request body and the push to subscribers.
/// Both fields are optional on the wire; a missing or malformed envelope
/// collapses to `("notification", {})`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushEvent {
    #[serde(default = "default_event_name")]
    pub event: String,
    #[serde(default)]
    pub payload: PayloadMap,
}

impl Default for PushEvent {
    fn default() -> Self {
        Self {
            event: default_event_name(),
            payload: PayloadMap::new(),
        }
    }
}

/// Acknowledgement returned by `POST /emit`, echoing the resolved envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmitAck {
    pub ok: bool,
    pub event: String,
    pub payload: PayloadMap,
}

/// Client-visible notification entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: NotificationKind,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub data: PayloadMap,
}

impl Notification {
    /// Normalizes a pushed payload into a notification record.
    ///
    /// Pushed events carry no authoritative server time, so `timestamp` is
    /// the local receipt instant. Events without an id get a synthetic
    /// timestamp-derived one. The message falls back `message` -> `body` ->
    /// empty.
    pub fn from_payload(payload: &PayloadMap) -> Self {
        let now = Utc::now();
        let id = payload
            .get("id")
            .and_then(FieldValue::as_text)
            .map(str::to_string)
            .unwrap_or_else(|| format!("push-{}", now.timestamp_millis()));
        let kind = payload
            .get("type")
            .and_then(FieldValue::as_text)
            .map(NotificationKind::parse)
            .unwrap_or_default();
        let title = payload
            .get("title")
            .and_then(FieldValue::as_text)
            .unwrap_or_default()
            .to_string();
        let message = payload
            .get("message")
            .or_else(|| payload.get("body"))
            .and_then(FieldValue::as_text)
            .unwrap_or_default()
            .to_string();
        let data = payload
            .get("data")
            .and_then(FieldValue::as_map)
            .cloned()
            .unwrap_or_default();

        Self {
            id,
            kind,
            title,
            message,
            timestamp: now,
            read: false,
            data,
        }
    }
}

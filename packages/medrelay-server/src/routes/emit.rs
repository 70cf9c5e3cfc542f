use crate::state::RelayState;
use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use medrelay_core::{EmitAck, PayloadMap, PushEvent};
use std::sync::Arc;
use tracing::debug;

/// Event ingress. Trusted-internal only: whoever can reach this endpoint
/// can broadcast to every connected subscriber.
pub(crate) async fn emit_handler(
    State(state): State<Arc<RelayState>>,
    body: Bytes,
) -> impl IntoResponse {
    let event = parse_emit_body(&body);
    state.hub.emit(event.clone());
    (
        StatusCode::OK,
        Json(EmitAck {
            ok: true,
            event: event.event,
            payload: event.payload,
        }),
    )
}

/// Defaults are substituted per field, never rejected: an unreadable body
/// yields the full default envelope, and a readable body with an
/// unrepresentable `payload` keeps its `event` name and defaults only the
/// payload.
fn parse_emit_body(body: &[u8]) -> PushEvent {
    let Ok(value) = serde_json::from_slice::<serde_json::Value>(body) else {
        debug!("emit body did not parse, substituting defaults");
        return PushEvent::default();
    };
    let event = value
        .get("event")
        .and_then(serde_json::Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| medrelay_core::DEFAULT_EVENT_NAME.to_string());
    let payload = match value.get("payload") {
        None => PayloadMap::new(),
        Some(payload) => serde_json::from_value(payload.clone()).unwrap_or_else(|err| {
            debug!(error = %err, "emit payload did not fit the field union, substituting empty");
            PayloadMap::new()
        }),
    };
    PushEvent { event, payload }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medrelay_core::FieldValue;

    #[test]
    fn test_parse_empty_body_substitutes_defaults() {
        let event = parse_emit_body(b"");
        assert_eq!(event, PushEvent::default());
    }

    #[test]
    fn test_parse_garbage_body_substitutes_defaults() {
        let event = parse_emit_body(b"not json at all");
        assert_eq!(event.event, "notification");
        assert!(event.payload.is_empty());
    }

    #[test]
    fn test_parse_keeps_event_when_payload_is_unrepresentable() {
        let event = parse_emit_body(br#"{"event":"vitals","payload":{"tags":[1,2]}}"#);
        assert_eq!(event.event, "vitals");
        assert!(event.payload.is_empty());
    }

    #[test]
    fn test_parse_defaults_event_of_wrong_type() {
        let event = parse_emit_body(br#"{"event":7,"payload":{"title":"kept"}}"#);
        assert_eq!(event.event, "notification");
        assert_eq!(
            event.payload.get("title"),
            Some(&FieldValue::Text("kept".to_string()))
        );
    }

    #[test]
    fn test_parse_partial_body_keeps_given_fields() {
        let event = parse_emit_body(br#"{"payload":{"title":"Refill due"}}"#);
        assert_eq!(event.event, "notification");
        assert_eq!(
            event.payload.get("title"),
            Some(&FieldValue::Text("Refill due".to_string()))
        );
    }
}

//! Webhook body decoding.
//!
//! Only the fields the service uses are modelled; unknown fields and event
//! types are tolerated so new platform features never fail a delivery.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use stash_core::{
    EventKind, EventOrigin, IncomingMessage, MessageKind, SourceError, WebhookEvent,
};

#[derive(Debug, Deserialize)]
struct WebhookBody {
    #[serde(default)]
    events: Vec<RawEvent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEvent {
    #[serde(rename = "type")]
    event_type: String,
    reply_token: Option<String>,
    source: Option<RawSource>,
    #[serde(default)]
    timestamp: i64,
    message: Option<RawMessage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSource {
    #[serde(rename = "type")]
    source_type: String,
    user_id: Option<String>,
    group_id: Option<String>,
    room_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    id: String,
    #[serde(rename = "type")]
    message_type: String,
    text: Option<String>,
}

/// Decode a webhook body. The signature must already have been checked.
pub fn decode_events(body: &[u8]) -> Result<Vec<WebhookEvent>, SourceError> {
    let body: WebhookBody =
        serde_json::from_slice(body).map_err(|e| SourceError::Decode(e.to_string()))?;
    Ok(body.events.into_iter().map(convert_event).collect())
}

fn convert_event(raw: RawEvent) -> WebhookEvent {
    let kind = match raw.event_type.as_str() {
        "message" => match raw.message {
            Some(message) => EventKind::Message(convert_message(message)),
            None => EventKind::Other("message".to_string()),
        },
        "join" => EventKind::Join,
        "memberJoined" => EventKind::MemberJoined,
        "follow" => EventKind::Follow,
        _ => EventKind::Other(raw.event_type),
    };

    WebhookEvent {
        reply_token: raw.reply_token,
        origin: raw.source.map_or(EventOrigin::Unknown, convert_source),
        timestamp: DateTime::from_timestamp_millis(raw.timestamp).unwrap_or_else(Utc::now),
        kind,
    }
}

fn convert_source(raw: RawSource) -> EventOrigin {
    match (raw.source_type.as_str(), raw.user_id, raw.group_id, raw.room_id) {
        ("user", Some(user_id), _, _) => EventOrigin::User { user_id },
        ("group", user_id, Some(group_id), _) => EventOrigin::Group { group_id, user_id },
        ("room", user_id, _, Some(room_id)) => EventOrigin::Room { room_id, user_id },
        _ => EventOrigin::Unknown,
    }
}

fn convert_message(raw: RawMessage) -> IncomingMessage {
    let kind = match raw.message_type.as_str() {
        "text" => MessageKind::Text {
            text: raw.text.unwrap_or_default(),
        },
        "image" => MessageKind::Image,
        "video" => MessageKind::Video,
        _ => MessageKind::Other(raw.message_type),
    };
    IncomingMessage { id: raw.id, kind }
}

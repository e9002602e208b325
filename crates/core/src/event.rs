//! Decoded webhook events and the payloads exchanged with the event source.
//!
//! These are platform-neutral: the LINE adapter maps its wire JSON onto them,
//! and the dispatcher only ever sees these types.

use chrono::{DateTime, Utc};

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// One event decoded from a webhook delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookEvent {
    /// Single-use, time-limited token for replying to this event.
    ///
    /// Absent for events that cannot be replied to (e.g. unfollow).
    pub reply_token: Option<String>,

    /// Where the event came from.
    pub origin: EventOrigin,

    /// When the platform observed the event.
    pub timestamp: DateTime<Utc>,

    /// What happened.
    pub kind: EventKind,
}

impl WebhookEvent {
    /// The id of the user that caused the event, whatever the chat type.
    ///
    /// Group and room events only carry a user id when the user has
    /// consented to share it, so this can be `None` outside 1:1 chats.
    pub fn user_id(&self) -> Option<&str> {
        match &self.origin {
            EventOrigin::User { user_id } => Some(user_id),
            EventOrigin::Group { user_id, .. } | EventOrigin::Room { user_id, .. } => {
                user_id.as_deref()
            }
            EventOrigin::Unknown => None,
        }
    }

    /// The message carried by the event, if it is a message event.
    pub fn message(&self) -> Option<&IncomingMessage> {
        match &self.kind {
            EventKind::Message(message) => Some(message),
            _ => None,
        }
    }
}

/// Origin of an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOrigin {
    /// A 1:1 chat with a user.
    User { user_id: String },
    /// A group chat.
    Group {
        group_id: String,
        user_id: Option<String>,
    },
    /// A multi-person room.
    Room {
        room_id: String,
        user_id: Option<String>,
    },
    /// A source type this service does not model.
    Unknown,
}

impl EventOrigin {
    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::User { .. } => "user",
            Self::Group { .. } => "group",
            Self::Room { .. } => "room",
            Self::Unknown => "unknown",
        }
    }
}

/// The kind of an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Message(IncomingMessage),
    /// The bot joined a group or room.
    Join,
    /// A user joined a group or room the bot is in.
    MemberJoined,
    /// A user added the bot as a friend.
    Follow,
    /// Any other event type, carrying the platform's type name.
    Other(String),
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// A message received from a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    /// Platform message id, used to fetch binary content.
    pub id: String,
    pub kind: MessageKind,
}

/// Message payload kinds relevant to archiving and commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageKind {
    Text { text: String },
    Image,
    Video,
    /// Stickers, audio, files, locations, ... carrying the platform type name.
    Other(String),
}

impl MessageKind {
    /// Short label for logs and object keys.
    pub fn label(&self) -> &str {
        match self {
            Self::Text { .. } => "text",
            Self::Image => "image",
            Self::Video => "video",
            Self::Other(kind) => kind,
        }
    }

    /// Whether the message carries binary content worth archiving.
    pub fn is_media(&self) -> bool {
        matches!(self, Self::Image | Self::Video)
    }
}

/// Binary content of a message as served by the event source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageContent {
    pub bytes: Vec<u8>,
    /// MIME type reported by the platform, e.g. `image/jpeg`.
    pub content_type: String,
    /// Declared length; falls back to `bytes.len()` when not reported.
    pub content_length: u64,
}

/// A reply sent back through the event source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyMessage {
    Text(String),
}

impl ReplyMessage {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }
}

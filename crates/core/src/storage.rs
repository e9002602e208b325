//! Object store contract, listing windows, and object key rules.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};

use crate::error::StorageError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Default validity of a presigned URL (30 minutes).
pub const DEFAULT_PRESIGN_TTL: Duration = Duration::from_secs(30 * 60);

/// Longest key accepted by S3 (in bytes).
const MAX_KEY_LEN: usize = 1024;

/// Extension used when the content type is unknown.
const FALLBACK_EXTENSION: &str = "bin";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One entry of a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSummary {
    pub key: String,
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
}

/// Optional time bounds for a listing, both inclusive.
///
/// Objects without a known modification time are excluded from any
/// bounded window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListWindow {
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl ListWindow {
    /// Unbounded window.
    pub fn all() -> Self {
        Self::default()
    }

    /// Everything modified at or after `since`.
    pub fn since(since: DateTime<Utc>) -> Self {
        Self {
            since: Some(since),
            until: None,
        }
    }

    /// Everything modified within the last `duration` before `now`.
    pub fn last(duration: chrono::Duration, now: DateTime<Utc>) -> Self {
        Self::since(now - duration)
    }

    pub fn is_bounded(&self) -> bool {
        self.since.is_some() || self.until.is_some()
    }

    /// Whether an object modified at `modified` falls inside the window.
    pub fn contains(&self, modified: Option<DateTime<Utc>>) -> bool {
        if !self.is_bounded() {
            return true;
        }
        let Some(modified) = modified else {
            return false;
        };
        self.since.map_or(true, |since| modified >= since)
            && self.until.map_or(true, |until| modified <= until)
    }
}

/// Object storage the service archives into and lists from.
///
/// A store instance is bound to one bucket (or base directory); all
/// operations take keys relative to it.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Short backend name for logs (`"s3"`, `"local"`).
    fn backend(&self) -> &'static str;

    /// Store `bytes` under `key`, replacing any existing object.
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str)
        -> Result<(), StorageError>;

    /// List objects whose key starts with `prefix`, filtered by `window`.
    ///
    /// Results are sorted newest first (objects without a timestamp last).
    async fn list(
        &self,
        prefix: &str,
        window: ListWindow,
    ) -> Result<Vec<ObjectSummary>, StorageError>;

    /// Issue a time-limited, publicly fetchable URL for `key`.
    async fn presign(&self, key: &str, ttl: Duration) -> Result<String, StorageError>;
}

// ---------------------------------------------------------------------------
// Key rules
// ---------------------------------------------------------------------------

/// Validate an object key supplied by a user command.
///
/// Rules:
/// - Must not be empty or exceed 1024 bytes.
/// - Must not start with `/`.
/// - Must not contain `..` path segments or control characters.
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey("key must not be empty".into()));
    }
    if key.len() > MAX_KEY_LEN {
        return Err(StorageError::InvalidKey(format!(
            "key must not exceed {MAX_KEY_LEN} bytes"
        )));
    }
    if key.starts_with('/') {
        return Err(StorageError::InvalidKey(format!(
            "key '{key}' must not start with '/'"
        )));
    }
    if key.split('/').any(|segment| segment == "..") {
        return Err(StorageError::InvalidKey(format!(
            "key '{key}' must not contain '..' segments"
        )));
    }
    if key.chars().any(char::is_control) {
        return Err(StorageError::InvalidKey(
            "key must not contain control characters".into(),
        ));
    }
    Ok(())
}

/// Build the key under which an archived media message is stored.
///
/// Layout: `{prefix}{kind}/{YYYY}/{MM}/{DD}/{unix_nanos}-{message_id}.{ext}`.
/// Event timestamps only carry milliseconds, so the message id is what keeps
/// two uploads from the same instant apart. Characters outside `[A-Za-z0-9]`
/// are dropped from the id so it cannot add path segments.
pub fn media_object_key(
    prefix: &str,
    kind: &str,
    message_id: &str,
    received_at: DateTime<Utc>,
    content_type: &str,
) -> String {
    let nanos = received_at
        .timestamp_nanos_opt()
        .unwrap_or_else(|| received_at.timestamp_micros().saturating_mul(1_000));
    let id: String = message_id
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect();
    format!(
        "{prefix}{kind}/{:04}/{:02}/{:02}/{nanos}-{id}.{}",
        received_at.year(),
        received_at.month(),
        received_at.day(),
        extension_for_content_type(content_type),
    )
}

/// Map a MIME type to a file extension.
pub fn extension_for_content_type(content_type: &str) -> &'static str {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match essence.as_str() {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/heic" => "heic",
        "video/mp4" => "mp4",
        "video/quicktime" => "mov",
        "video/webm" => "webm",
        "video/3gpp" => "3gp",
        _ => FALLBACK_EXTENSION,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

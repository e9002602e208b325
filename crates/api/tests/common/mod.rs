#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use chrono::{DateTime, TimeZone, Utc};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use stash_api::config::{ServerConfig, StorageConfig};
use stash_api::engine::{Dispatcher, JobContext};
use stash_api::router::build_app_router;
use stash_api::state::AppState;
use stash_core::storage::DEFAULT_PRESIGN_TTL;
use stash_core::{
    AllowList, EventKind, EventOrigin, EventSource, IncomingMessage, ListWindow, MessageContent,
    MessageKind, ObjectStore, ObjectSummary, ReplyMessage, SourceError, StorageError,
    WebhookEvent,
};
use stash_line::{signature, webhook, SIGNATURE_HEADER};
use stash_worker::WorkerPool;

pub const SECRET: &str = "test-channel-secret";
pub const ALLOWED_USER: &str = "U-allowed";
pub const STRANGER: &str = "U-stranger";
pub const KEY_PREFIX: &str = "media/";

// ---------------------------------------------------------------------------
// Fake event source
// ---------------------------------------------------------------------------

/// Records replies and serves canned message content.
#[derive(Default)]
pub struct FakeSource {
    replies: Mutex<Vec<(String, Vec<ReplyMessage>)>>,
    content: Mutex<HashMap<String, MessageContent>>,
    fail_content: AtomicBool,
    quota: Mutex<Option<u64>>,
}

impl FakeSource {
    pub fn with_content(self, message_id: &str, bytes: &[u8], content_type: &str) -> Self {
        self.content.lock().unwrap().insert(
            message_id.to_string(),
            MessageContent {
                bytes: bytes.to_vec(),
                content_type: content_type.to_string(),
                content_length: bytes.len() as u64,
            },
        );
        self
    }

    pub fn failing_content(self) -> Self {
        self.fail_content.store(true, Ordering::SeqCst);
        self
    }

    pub fn with_quota(self, remaining: Option<u64>) -> Self {
        *self.quota.lock().unwrap() = remaining;
        self
    }

    pub fn replies(&self) -> Vec<(String, Vec<ReplyMessage>)> {
        self.replies.lock().unwrap().clone()
    }

    /// Text of the single reply sent with `token`.
    pub fn reply_text(&self, token: &str) -> Option<String> {
        self.replies()
            .into_iter()
            .find(|(t, _)| t == token)
            .and_then(|(_, messages)| messages.into_iter().next())
            .map(|ReplyMessage::Text(text)| text)
    }
}

#[async_trait]
impl EventSource for FakeSource {
    fn parse_request(
        &self,
        signature: Option<&str>,
        body: &[u8],
    ) -> Result<Vec<WebhookEvent>, SourceError> {
        let signature = signature.ok_or(SourceError::InvalidSignature)?;
        if !signature::verify(SECRET, body, signature) {
            return Err(SourceError::InvalidSignature);
        }
        webhook::decode_events(body)
    }

    async fn get_content(&self, message_id: &str) -> Result<MessageContent, SourceError> {
        if self.fail_content.load(Ordering::SeqCst) {
            return Err(SourceError::HttpStatus {
                status: 503,
                body: "unavailable".into(),
            });
        }
        self.content
            .lock()
            .unwrap()
            .get(message_id)
            .cloned()
            .ok_or_else(|| SourceError::HttpStatus {
                status: 404,
                body: "no content".into(),
            })
    }

    async fn reply(
        &self,
        reply_token: &str,
        messages: Vec<ReplyMessage>,
    ) -> Result<(), SourceError> {
        self.replies
            .lock()
            .unwrap()
            .push((reply_token.to_string(), messages));
        Ok(())
    }

    async fn remaining_quota(&self) -> Result<Option<u64>, SourceError> {
        Ok(*self.quota.lock().unwrap())
    }
}

// ---------------------------------------------------------------------------
// Fake object store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub key: String,
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub last_modified: DateTime<Utc>,
}

/// In-memory store.
#[derive(Default)]
pub struct FakeStore {
    objects: Mutex<Vec<StoredObject>>,
    put_delay: Option<Duration>,
}

impl FakeStore {
    pub fn with_object(self, key: &str, last_modified: DateTime<Utc>) -> Self {
        self.objects.lock().unwrap().push(StoredObject {
            key: key.to_string(),
            bytes: vec![0],
            content_type: "application/octet-stream".into(),
            last_modified,
        });
        self
    }

    /// Make every `put` take `delay` before it lands.
    pub fn with_put_delay(mut self, delay: Duration) -> Self {
        self.put_delay = Some(delay);
        self
    }

    pub fn objects(&self) -> Vec<StoredObject> {
        self.objects.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for FakeStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), StorageError> {
        if let Some(delay) = self.put_delay {
            tokio::time::sleep(delay).await;
        }
        self.objects.lock().unwrap().push(StoredObject {
            key: key.to_string(),
            bytes,
            content_type: content_type.to_string(),
            last_modified: Utc::now(),
        });
        Ok(())
    }

    async fn list(
        &self,
        prefix: &str,
        window: ListWindow,
    ) -> Result<Vec<ObjectSummary>, StorageError> {
        let mut listed: Vec<ObjectSummary> = self
            .objects()
            .into_iter()
            .filter(|o| o.key.starts_with(prefix) && window.contains(Some(o.last_modified)))
            .map(|o| ObjectSummary {
                key: o.key,
                size: o.bytes.len() as u64,
                last_modified: Some(o.last_modified),
            })
            .collect();
        listed.sort_by(|a, b| b.last_modified.cmp(&a.last_modified));
        Ok(listed)
    }

    async fn presign(&self, key: &str, ttl: Duration) -> Result<String, StorageError> {
        Ok(format!("https://stash.test/{key}?expires={}", ttl.as_secs()))
    }
}

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        request_timeout_secs: 30,
        channel_secret: SECRET.to_string(),
        channel_access_token: "test-token".to_string(),
        allowed_users: AllowList::new([ALLOWED_USER]),
        worker_queue_capacity: 8,
        worker_count: 2,
        storage: StorageConfig::Local {
            path: "./unused".into(),
        },
        object_key_prefix: KEY_PREFIX.to_string(),
        presign_ttl_secs: DEFAULT_PRESIGN_TTL.as_secs(),
    }
}

/// A running pool plus the dispatcher feeding it and the fakes behind it.
pub struct Harness {
    pub config: ServerConfig,
    pub source: Arc<FakeSource>,
    pub store: Arc<FakeStore>,
    pub pool: WorkerPool,
    pub dispatcher: Arc<Dispatcher>,
}

impl Harness {
    pub fn new(source: FakeSource, store: FakeStore) -> Self {
        Self::with_config(test_config(), source, store)
    }

    /// Like [`Harness::new`], but with pool sizing and timeouts from `config`.
    pub fn with_config(config: ServerConfig, source: FakeSource, store: FakeStore) -> Self {
        let source = Arc::new(source);
        let store = Arc::new(store);
        let pool = WorkerPool::new(config.worker_queue_capacity, config.worker_count).unwrap();

        let dispatcher = Dispatcher::new(
            config.allowed_users.clone(),
            pool.submitter(),
            JobContext {
                source: Arc::clone(&source) as Arc<dyn EventSource>,
                store: Arc::clone(&store) as Arc<dyn ObjectStore>,
                key_prefix: config.object_key_prefix.clone(),
                presign_ttl: config.presign_ttl(),
            },
        );

        Self {
            config,
            source,
            store,
            pool,
            dispatcher: Arc::new(dispatcher),
        }
    }

    /// The full application router with all middleware layers.
    pub fn router(&self) -> Router {
        let state = AppState {
            config: Arc::new(self.config.clone()),
            source: Arc::clone(&self.source) as Arc<dyn EventSource>,
            dispatcher: Arc::clone(&self.dispatcher),
        };
        build_app_router(state)
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

pub fn received_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 9, 16, 0, 0).unwrap()
}

pub fn message_event(user_id: &str, token: &str, id: &str, kind: MessageKind) -> WebhookEvent {
    WebhookEvent {
        reply_token: Some(token.to_string()),
        origin: EventOrigin::User {
            user_id: user_id.to_string(),
        },
        timestamp: received_at(),
        kind: EventKind::Message(IncomingMessage {
            id: id.to_string(),
            kind,
        }),
    }
}

pub fn text_event(user_id: &str, token: &str, text: &str) -> WebhookEvent {
    message_event(
        user_id,
        token,
        &format!("m-{token}"),
        MessageKind::Text {
            text: text.to_string(),
        },
    )
}

/// Wire JSON for a text message event.
pub fn text_event_json(user_id: &str, token: &str, text: &str) -> Value {
    json!({
        "type": "message",
        "replyToken": token,
        "source": {"type": "user", "userId": user_id},
        "timestamp": 1_710_000_000_000_i64,
        "mode": "active",
        "message": {"type": "text", "id": format!("m-{token}"), "text": text},
    })
}

/// Wire JSON for an image message event.
pub fn image_event_json(user_id: &str, token: &str, message_id: &str) -> Value {
    json!({
        "type": "message",
        "replyToken": token,
        "source": {"type": "user", "userId": user_id},
        "timestamp": 1_710_000_000_000_i64,
        "mode": "active",
        "message": {
            "type": "image",
            "id": message_id,
            "contentProvider": {"type": "line"},
        },
    })
}

pub fn webhook_body(events: Vec<Value>) -> Vec<u8> {
    serde_json::to_vec(&json!({"destination": "Ubot", "events": events})).unwrap()
}

// ---------------------------------------------------------------------------
// HTTP helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// POST `body` to `uri` with `signature` as the signature header, if any.
pub async fn post_webhook(
    app: Router,
    uri: &str,
    body: Vec<u8>,
    signature: Option<&str>,
) -> Response<Body> {
    let mut request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(signature) = signature {
        request = request.header(SIGNATURE_HEADER, signature);
    }
    app.oneshot(request.body(Body::from(body)).unwrap())
        .await
        .unwrap()
}

pub fn sign(body: &[u8]) -> String {
    signature::sign(SECRET, body)
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

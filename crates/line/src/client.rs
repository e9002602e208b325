//! HTTP client for the LINE Messaging API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use serde_json::json;
use stash_core::{EventSource, MessageContent, ReplyMessage, SourceError, WebhookEvent};

use crate::{signature, webhook};

/// Default base URL for messaging endpoints.
pub const DEFAULT_API_BASE: &str = "https://api.line.me";

/// Default base URL for content downloads.
pub const DEFAULT_DATA_API_BASE: &str = "https://api-data.line.me";

/// HTTP request timeout for a single API call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum messages accepted in one reply.
const MAX_REPLY_MESSAGES: usize = 5;

/// Maximum characters in one text message.
const MAX_TEXT_CHARS: usize = 5000;

/// Credentials and endpoints for the Messaging API.
#[derive(Debug, Clone)]
pub struct LineConfig {
    pub channel_secret: String,
    pub channel_access_token: String,
    pub api_base: String,
    pub data_api_base: String,
}

impl LineConfig {
    /// Config pointing at the production endpoints.
    pub fn new(channel_secret: impl Into<String>, channel_access_token: impl Into<String>) -> Self {
        Self {
            channel_secret: channel_secret.into(),
            channel_access_token: channel_access_token.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            data_api_base: DEFAULT_DATA_API_BASE.to_string(),
        }
    }

    /// Send every request to `base` instead (tests, proxies).
    pub fn with_base_url(mut self, base: impl Into<String>) -> Self {
        let base = base.into();
        self.api_base = base.clone();
        self.data_api_base = base;
        self
    }
}

#[derive(Debug, Deserialize)]
struct QuotaResponse {
    #[serde(rename = "type")]
    quota_type: String,
    value: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConsumptionResponse {
    total_usage: u64,
}

/// [`EventSource`] backed by the LINE Messaging API.
pub struct LineClient {
    http: reqwest::Client,
    config: LineConfig,
}

impl LineClient {
    pub fn new(config: LineConfig) -> Result<Self, SourceError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SourceError::Request(e.to_string()))?;
        Ok(Self { http, config })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_base.trim_end_matches('/'))
    }

    fn data_url(&self, path: &str) -> String {
        format!("{}{path}", self.config.data_api_base.trim_end_matches('/'))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, SourceError> {
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.config.channel_access_token)
            .send()
            .await
            .map_err(request_error)?;
        let response = check_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| SourceError::Decode(e.to_string()))
    }
}

#[async_trait]
impl EventSource for LineClient {
    fn parse_request(
        &self,
        signature: Option<&str>,
        body: &[u8],
    ) -> Result<Vec<WebhookEvent>, SourceError> {
        let signature = signature.ok_or(SourceError::InvalidSignature)?;
        if !signature::verify(&self.config.channel_secret, body, signature) {
            return Err(SourceError::InvalidSignature);
        }
        webhook::decode_events(body)
    }

    async fn get_content(&self, message_id: &str) -> Result<MessageContent, SourceError> {
        let url = self.data_url(&format!("/v2/bot/message/{message_id}/content"));
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.config.channel_access_token)
            .send()
            .await
            .map_err(request_error)?;
        let response = check_status(response).await?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let declared_length = response.content_length();
        let bytes = response.bytes().await.map_err(request_error)?.to_vec();

        tracing::debug!(
            message_id,
            content_type = %content_type,
            size = bytes.len(),
            "Downloaded message content"
        );

        Ok(MessageContent {
            content_length: declared_length.unwrap_or(bytes.len() as u64),
            content_type,
            bytes,
        })
    }

    async fn reply(
        &self,
        reply_token: &str,
        messages: Vec<ReplyMessage>,
    ) -> Result<(), SourceError> {
        let messages: Vec<_> = messages
            .into_iter()
            .take(MAX_REPLY_MESSAGES)
            .map(|message| match message {
                ReplyMessage::Text(text) => json!({
                    "type": "text",
                    "text": truncate_chars(&text, MAX_TEXT_CHARS),
                }),
            })
            .collect();
        let payload = json!({
            "replyToken": reply_token,
            "messages": messages,
        });

        let response = self
            .http
            .post(self.api_url("/v2/bot/message/reply"))
            .bearer_auth(&self.config.channel_access_token)
            .json(&payload)
            .send()
            .await
            .map_err(request_error)?;
        check_status(response).await?;
        Ok(())
    }

    async fn remaining_quota(&self) -> Result<Option<u64>, SourceError> {
        let quota: QuotaResponse = self.get_json(&self.api_url("/v2/bot/message/quota")).await?;
        let limit = match (quota.quota_type.as_str(), quota.value) {
            ("limited", Some(limit)) => limit,
            _ => return Ok(None),
        };
        let consumption: ConsumptionResponse = self
            .get_json(&self.api_url("/v2/bot/message/quota/consumption"))
            .await?;
        Ok(Some(limit.saturating_sub(consumption.total_usage)))
    }
}

fn request_error(err: reqwest::Error) -> SourceError {
    SourceError::Request(err.to_string())
}

/// Turn a non-2xx response into [`SourceError::HttpStatus`].
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, SourceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(SourceError::HttpStatus {
        status: status.as_u16(),
        body,
    })
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

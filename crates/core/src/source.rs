use async_trait::async_trait;

use crate::error::SourceError;
use crate::event::{MessageContent, ReplyMessage, WebhookEvent};

/// The messaging platform that delivers webhooks and accepts replies.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Verify `signature` against the raw `body` and decode the events in it.
    ///
    /// Returns [`SourceError::InvalidSignature`] when the signature is absent
    /// or wrong; callers map that to HTTP 400 and everything else to 500.
    fn parse_request(
        &self,
        signature: Option<&str>,
        body: &[u8],
    ) -> Result<Vec<WebhookEvent>, SourceError>;

    /// Download the binary content attached to a message.
    async fn get_content(&self, message_id: &str) -> Result<MessageContent, SourceError>;

    /// Reply to an event. A reply token can be used once.
    async fn reply(
        &self,
        reply_token: &str,
        messages: Vec<ReplyMessage>,
    ) -> Result<(), SourceError>;

    /// Remaining messages in the current quota period.
    ///
    /// `None` means the plan has no limit. Informational only.
    async fn remaining_quota(&self) -> Result<Option<u64>, SourceError>;
}

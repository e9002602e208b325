//! The work done for one accepted event.
//!
//! Runs on a pool worker. Collaborator failures end in a generic apology to
//! the user and a [`JobError`] for the pool to log; they are not retried.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use stash_core::commands::{format_listing, HELP_TEXT};
use stash_core::storage::{media_object_key, validate_key};
use stash_core::{
    Command, CommandError, EventSource, IncomingMessage, ListWindow, MessageKind, ObjectStore,
    ReplyMessage, SourceError, StorageError, WebhookEvent,
};
use stash_worker::{Job, JobError, JobResult};

/// Sent when handling fails for a reason the user cannot fix.
pub const GENERIC_FAILURE_REPLY: &str = "Sorry, something went wrong. Please try again later.";

/// Collaborators and settings shared by every job.
pub struct JobContext {
    pub source: Arc<dyn EventSource>,
    pub store: Arc<dyn ObjectStore>,
    pub key_prefix: String,
    pub presign_ttl: Duration,
}

#[derive(Debug, thiserror::Error)]
enum HandleError {
    #[error("event source: {0}")]
    Source(#[from] SourceError),

    #[error("object store: {0}")]
    Storage(#[from] StorageError),
}

/// Build the job for one authorized event.
pub fn event_job(ctx: Arc<JobContext>, event: WebhookEvent) -> Job {
    let label = match event.message() {
        Some(message) => format!("message:{}", message.id),
        None => "event".to_string(),
    };
    Job::new(move || async move { handle_event(&ctx, event).await }).with_label(label)
}

/// Handle one event end to end, replying through the event source.
pub async fn handle_event(ctx: &JobContext, event: WebhookEvent) -> JobResult {
    let Some(message) = event.message() else {
        return Ok(());
    };

    let reply = match respond(ctx, message, event.timestamp).await {
        Ok(Some(reply)) => reply,
        Ok(None) => return Ok(()),
        Err(err) => {
            if let Some(token) = &event.reply_token {
                if let Err(reply_err) = ctx
                    .source
                    .reply(token, vec![ReplyMessage::text(GENERIC_FAILURE_REPLY)])
                    .await
                {
                    tracing::debug!(error = %reply_err, "Failure reply not delivered");
                }
            }
            return Err(JobError::new(err.to_string()));
        }
    };

    let Some(token) = &event.reply_token else {
        tracing::debug!(message_id = %message.id, "No reply token, reply dropped");
        return Ok(());
    };
    ctx.source
        .reply(token, vec![reply])
        .await
        .map_err(|e| JobError::new(format!("reply failed: {e}")))
}

async fn respond(
    ctx: &JobContext,
    message: &IncomingMessage,
    received_at: DateTime<Utc>,
) -> Result<Option<ReplyMessage>, HandleError> {
    match &message.kind {
        MessageKind::Text { text } => match Command::parse(text) {
            Ok(Some(command)) => run_command(ctx, command).await.map(Some),
            Ok(None) => Ok(None),
            Err(err) => Ok(Some(usage_reply(&err))),
        },
        MessageKind::Image | MessageKind::Video => {
            archive_media(ctx, message, received_at).await.map(Some)
        }
        MessageKind::Other(kind) => {
            tracing::debug!(message_id = %message.id, kind = %kind, "Ignoring message");
            Ok(None)
        }
    }
}

fn usage_reply(err: &CommandError) -> ReplyMessage {
    ReplyMessage::text(err.to_string())
}

async fn archive_media(
    ctx: &JobContext,
    message: &IncomingMessage,
    received_at: DateTime<Utc>,
) -> Result<ReplyMessage, HandleError> {
    let content = ctx.source.get_content(&message.id).await?;
    let key = media_object_key(
        &ctx.key_prefix,
        message.kind.label(),
        &message.id,
        received_at,
        &content.content_type,
    );
    let size = content.bytes.len();
    ctx.store
        .put(&key, content.bytes, &content.content_type)
        .await?;

    tracing::info!(
        message_id = %message.id,
        key = %key,
        size,
        backend = ctx.store.backend(),
        "Archived media"
    );
    Ok(ReplyMessage::text(format!("Saved {key}")))
}

async fn run_command(ctx: &JobContext, command: Command) -> Result<ReplyMessage, HandleError> {
    tracing::debug!(command = command.name(), "Running command");

    let text = match command {
        Command::Help => HELP_TEXT.to_string(),
        Command::List { prefix } => {
            let objects = ctx.store.list(&prefix, ListWindow::all()).await?;
            let keys: Vec<String> = objects.into_iter().map(|o| o.key).collect();
            format_listing(&keys)
        }
        Command::Recent { hours } => {
            let window = ListWindow::last(chrono::Duration::hours(i64::from(hours)), Utc::now());
            let objects = ctx.store.list("", window).await?;
            let keys: Vec<String> = objects.into_iter().map(|o| o.key).collect();
            format_listing(&keys)
        }
        Command::Presign { key } => {
            if let Err(err) = validate_key(&key) {
                return Ok(ReplyMessage::text(err.to_string()));
            }
            ctx.store.presign(&key, ctx.presign_ttl).await?
        }
        Command::Quota => match ctx.source.remaining_quota().await? {
            Some(remaining) => format!("Remaining replies this month: {remaining}"),
            None => "Reply quota is unlimited.".to_string(),
        },
    };
    Ok(ReplyMessage::text(text))
}

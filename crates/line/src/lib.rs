//! LINE Messaging API adapter.
//!
//! - [`signature`] checks the `X-Line-Signature` header.
//! - [`webhook`] decodes webhook bodies into [`stash_core::WebhookEvent`]s.
//! - [`LineClient`] implements [`stash_core::EventSource`] over the HTTP API.

pub mod client;
pub mod signature;
pub mod webhook;

pub use client::{LineClient, LineConfig};

/// Header carrying the webhook body signature.
pub const SIGNATURE_HEADER: &str = "x-line-signature";

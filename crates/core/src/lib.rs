//! Domain types and collaborator contracts shared by every linestash crate.
//!
//! Nothing in here performs I/O. The two external collaborators are expressed
//! as traits:
//!
//! - [`EventSource`] decodes webhook deliveries, fetches message content and
//!   sends replies (implemented by `stash-line`).
//! - [`ObjectStore`] stores, lists and presigns objects (implemented by
//!   `stash-cloud`).

pub mod allow_list;
pub mod commands;
pub mod error;
pub mod event;
pub mod source;
pub mod storage;

pub use allow_list::AllowList;
pub use commands::{Command, CommandError};
pub use error::{SourceError, StorageError};
pub use event::{
    EventKind, EventOrigin, IncomingMessage, MessageContent, MessageKind, ReplyMessage,
    WebhookEvent,
};
pub use source::EventSource;
pub use storage::{ListWindow, ObjectStore, ObjectSummary};

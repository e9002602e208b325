//! Text commands understood by the bot.
//!
//! Parsing is pure; the API crate executes the parsed [`Command`] against
//! the object store.

/// Default look-back for `recent`.
pub const DEFAULT_RECENT_HOURS: u32 = 24;

/// Longest look-back accepted by `recent` (30 days).
pub const MAX_RECENT_HOURS: u32 = 720;

/// Maximum number of keys included in a listing reply.
pub const MAX_LISTED_KEYS: usize = 20;

/// Usage text sent in reply to `help`.
pub const HELP_TEXT: &str = "Commands:\n\
    ls [prefix] - list stored objects\n\
    recent [hours] - objects stored in the last hours (default 24)\n\
    url <key> - temporary download link (30 min)\n\
    quota - remaining reply quota\n\
    help - this message";

/// A parsed text command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    List { prefix: String },
    Recent { hours: u32 },
    Presign { key: String },
    Quota,
}

/// A message that looked like a command but had bad arguments.
///
/// The display text is meant to be sent back to the user as-is.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("usage: {command} {usage}")]
    MissingArgument {
        command: &'static str,
        usage: &'static str,
    },

    #[error("'{0}' is not a number of hours between 1 and {MAX_RECENT_HOURS}")]
    InvalidHours(String),
}

impl Command {
    /// Parse a text message.
    ///
    /// Returns `Ok(None)` for text that is not a command at all, so ordinary
    /// chat is ignored rather than answered.
    pub fn parse(text: &str) -> Result<Option<Self>, CommandError> {
        let mut words = text.split_whitespace();
        let Some(head) = words.next() else {
            return Ok(None);
        };
        let arg = words.next();

        let command = match head.to_ascii_lowercase().as_str() {
            "help" | "?" => Self::Help,
            "ls" | "list" => Self::List {
                prefix: arg.unwrap_or_default().to_string(),
            },
            "recent" => Self::Recent {
                hours: match arg {
                    None => DEFAULT_RECENT_HOURS,
                    Some(raw) => parse_hours(raw)?,
                },
            },
            "url" | "get" => {
                let key = arg.ok_or(CommandError::MissingArgument {
                    command: "url",
                    usage: "<key>",
                })?;
                Self::Presign {
                    key: key.to_string(),
                }
            }
            "quota" => Self::Quota,
            _ => return Ok(None),
        };
        Ok(Some(command))
    }

    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Help => "help",
            Self::List { .. } => "ls",
            Self::Recent { .. } => "recent",
            Self::Presign { .. } => "url",
            Self::Quota => "quota",
        }
    }
}

fn parse_hours(raw: &str) -> Result<u32, CommandError> {
    match raw.parse::<u32>() {
        Ok(hours) if (1..=MAX_RECENT_HOURS).contains(&hours) => Ok(hours),
        _ => Err(CommandError::InvalidHours(raw.to_string())),
    }
}

/// Render a listing reply, newest first, truncated to [`MAX_LISTED_KEYS`].
pub fn format_listing(keys: &[String]) -> String {
    if keys.is_empty() {
        return "No objects found.".to_string();
    }
    let shown = &keys[..keys.len().min(MAX_LISTED_KEYS)];
    let mut reply = shown.join("\n");
    if keys.len() > shown.len() {
        reply.push_str(&format!("\n... and {} more", keys.len() - shown.len()));
    }
    reply
}

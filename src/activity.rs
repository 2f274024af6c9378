//! User activity log sink
//!
//! Recording is fire-and-forget: sinks never block the handler and never
//! report errors back to it.

use chrono::Utc;
use std::fmt;

use crate::types::updates::Sender;

/// Kind of input that produced a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// Typed text
    Text,
    /// Transcribed voice or video note
    Voice,
}

/// Tagged user activity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityEvent {
    /// `/start` handled
    BotStart,
    /// `/new` handled
    NewConversation,
    /// `/help` handled
    HelpCommand,
    /// A generated reply was delivered
    MessageSent(InputKind),
}

impl fmt::Display for ActivityEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Self::BotStart => "bot_start",
            Self::NewConversation => "new_conversation",
            Self::HelpCommand => "help_command",
            Self::MessageSent(InputKind::Text) => "message_sent_text",
            Self::MessageSent(InputKind::Voice) => "message_sent_voice",
        };
        f.write_str(tag)
    }
}

/// Sink for user activity records
pub trait ActivityLog: Send + Sync {
    /// Record one event for `user`
    fn record(&self, user: &Sender, event: ActivityEvent);
}

/// Activity sink writing to the `activity` log target
#[derive(Debug, Default, Clone, Copy)]
pub struct LogActivityLog;

impl ActivityLog for LogActivityLog {
    fn record(&self, user: &Sender, event: ActivityEvent) {
        log::info!(
            target: "activity",
            "User activity - ID: {}, Username: {}, FirstName: {}, Event: {}, At: {}",
            user.id,
            user.username.as_deref().unwrap_or(""),
            user.first_name,
            event,
            Utc::now().to_rfc3339()
        );
    }
}

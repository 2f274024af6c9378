//! Inbound event and outbound formatting types
//!
//! Platform-neutral shapes of what the update feed delivers and what the
//! messaging API accepts. Platform clients map their wire formats into these.

use super::identifiers::{ChatId, FileId, MessageId, UserId};

// ============================================================================
// Inbound Events
// ============================================================================

/// One event pulled from the update feed
#[derive(Debug, Clone)]
pub struct Update {
    /// Monotonic feed position
    pub update_id: i64,
    /// The message carried by this update, if any
    pub message: Option<IncomingMessage>,
}

/// Author of an inbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    /// User identity
    pub id: UserId,
    /// Public username, if the user has one
    pub username: Option<String>,
    /// Display (first) name
    pub first_name: String,
}

/// An inbound chat message
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    /// Platform message ID
    pub message_id: MessageId,
    /// Chat the message arrived in
    pub chat: ChatId,
    /// Author of the message
    pub from: Sender,
    /// Text body, if any
    pub text: Option<String>,
    /// Voice recording attachment
    pub voice: Option<FileId>,
    /// Round video-note attachment (its audio is transcribed like voice)
    pub video_note: Option<FileId>,
}

impl IncomingMessage {
    /// Command name if the text is a bot command
    ///
    /// `/new@my_bot extra words` yields `Some("new")`.
    #[must_use]
    pub fn command(&self) -> Option<&str> {
        let text = self.text.as_deref()?;
        let token = text.strip_prefix('/')?.split_whitespace().next()?;
        let name = token.split('@').next().unwrap_or(token);
        (!name.is_empty()).then_some(name)
    }

    /// Audio attachment to transcribe, preferring voice over video note
    #[must_use]
    pub fn audio_file(&self) -> Option<&FileId> {
        self.voice.as_ref().or(self.video_note.as_ref())
    }

    /// Whether this message carries audio rather than text
    #[must_use]
    pub fn is_voice(&self) -> bool {
        self.audio_file().is_some()
    }
}

// ============================================================================
// Outbound Formatting
// ============================================================================

/// Formatting applied to an outgoing message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    /// Rich text (legacy Markdown)
    Markdown,
    /// No markup interpretation
    Plain,
}

impl ParseMode {
    /// Wire value of the platform's `parse_mode` field
    #[must_use]
    pub const fn as_wire(self) -> Option<&'static str> {
        match self {
            Self::Markdown => Some("Markdown"),
            Self::Plain => None,
        }
    }
}

/// Entry of the bot's command menu
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct BotCommand {
    /// Command name without the leading slash
    pub command: String,
    /// Human-readable description
    pub description: String,
}

impl BotCommand {
    /// Create a command menu entry
    pub fn new(command: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            description: description.into(),
        }
    }
}

/// Membership status of a user in a channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberStatus {
    /// Channel owner
    Creator,
    /// Channel administrator
    Administrator,
    /// Regular member
    Member,
    /// Member with restrictions
    Restricted,
    /// Not a member any more
    Left,
    /// Removed and banned
    Kicked,
    /// Status string this crate does not know
    Other(String),
}

impl MemberStatus {
    /// Parse the platform's status string
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            "creator" => Self::Creator,
            "administrator" => Self::Administrator,
            "member" => Self::Member,
            "restricted" => Self::Restricted,
            "left" => Self::Left,
            "kicked" | "banned" => Self::Kicked,
            other => Self::Other(other.to_string()),
        }
    }

    /// Whether the user currently belongs to the channel
    #[must_use]
    pub fn is_subscribed(&self) -> bool {
        !matches!(self, Self::Left | Self::Kicked)
    }
}

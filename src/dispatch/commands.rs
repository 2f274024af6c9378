//! Command classification for inbound events

use crate::types::updates::{BotCommand, IncomingMessage, Update};

/// Commands with dedicated handlers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `/start`
    Start,
    /// `/new`
    New,
    /// `/help`
    Help,
}

impl Command {
    /// Parse a command name (without slash or bot suffix)
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "start" => Some(Self::Start),
            "new" => Some(Self::New),
            "help" => Some(Self::Help),
            _ => None,
        }
    }
}

/// What an inbound event asks the bot to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Run a dedicated command handler
    Command(Command),
    /// Generate a reply to a text or voice message
    Message,
}

/// Classify an update into an intent and the message it carries
///
/// Updates without a message and unknown commands yield `None`.
#[must_use]
pub fn classify(update: Update) -> Option<(Intent, IncomingMessage)> {
    let message = update.message?;
    let intent = match message.command() {
        Some(name) => Intent::Command(Command::parse(name)?),
        None => Intent::Message,
    };
    Some((intent, message))
}

/// Command menu installed at startup
#[must_use]
pub fn command_menu() -> Vec<BotCommand> {
    vec![
        BotCommand::new("start", "Start the bot and get welcome message"),
        BotCommand::new("new", "Start new conversation (clear context)"),
        BotCommand::new("help", "Get help and support information"),
    ]
}

//! Type definitions for the chat relay
//!
//! This module contains the domain types shared across the crate,
//! organized into logical submodules:
//!
//! - [`identifiers`] - Type-safe ID wrappers (`UserId`, `ChatId`, `MessageId`, `FileId`)
//! - [`messages`] - Conversation history entries and completion requests
//! - [`updates`] - Inbound events and outbound formatting
//! - [`options`] - Runtime settings and their builder

pub mod identifiers;
pub mod messages;
pub mod options;
pub mod updates;

// Re-export commonly used types
pub use identifiers::{ChannelRef, ChatId, FileId, MessageId, UserId};
pub use messages::{ChatMessage, CompletionRequest, Role};
pub use options::{BotSettings, BotSettingsBuilder, CompletionOptions, RelayOptions};
pub use updates::{BotCommand, IncomingMessage, MemberStatus, ParseMode, Sender, Update};

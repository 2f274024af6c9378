//! Messaging platform seam
//!
//! This module provides the platform abstraction consumed by the relay and
//! the dispatch loop, plus the Telegram Bot API implementation.

pub mod telegram;

use futures::stream::BoxStream;
use std::future::Future;
use std::time::Duration;

use crate::error::Result;
use crate::types::identifiers::{ChannelRef, ChatId, FileId, MessageId, UserId};
use crate::types::updates::{BotCommand, MemberStatus, ParseMode, Update};

/// Live, indefinite feed of inbound events
pub type UpdateFeed = BoxStream<'static, Result<Update>>;

/// Messaging platform client
///
/// Error messages returned from these calls may carry a flood-control
/// signal that [`retry_with_backoff`](crate::backoff::retry_with_backoff)
/// understands.
pub trait MessagingPlatform: Send + Sync + 'static {
    /// Send a new message and return its handle
    ///
    /// # Errors
    /// Returns error if the platform rejects the message
    fn send_message(
        &self,
        chat: ChatId,
        text: &str,
        mode: ParseMode,
    ) -> impl Future<Output = Result<MessageId>> + Send;

    /// Replace the text of a previously sent message
    ///
    /// # Errors
    /// Returns error if the platform rejects the edit (for example invalid markup)
    fn edit_message(
        &self,
        chat: ChatId,
        message: MessageId,
        text: &str,
        mode: ParseMode,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Show the "typing" indicator in a chat
    ///
    /// # Errors
    /// Returns error if the request fails
    fn send_typing(&self, chat: ChatId) -> impl Future<Output = Result<()>> + Send;

    /// Open the live update feed
    ///
    /// The feed never ends on its own; transport failures are yielded as
    /// `Err` items and polling continues.
    fn updates(&self, poll_timeout: Duration) -> UpdateFeed;

    /// Resolve a file reference to a downloadable URL
    ///
    /// # Errors
    /// Returns error if the file is unknown or expired
    fn resolve_file(&self, file: &FileId) -> impl Future<Output = Result<String>> + Send;

    /// Download the bytes behind a resolved file URL
    ///
    /// # Errors
    /// Returns error if the download fails
    fn download_file(&self, url: &str) -> impl Future<Output = Result<Vec<u8>>> + Send;

    /// Install the bot's command menu
    ///
    /// # Errors
    /// Returns error if the platform rejects the menu
    fn set_commands(&self, commands: &[BotCommand]) -> impl Future<Output = Result<()>> + Send;

    /// Look up a user's membership status in a channel
    ///
    /// # Errors
    /// Returns error if the lookup fails
    fn chat_member_status(
        &self,
        channel: &ChannelRef,
        user: UserId,
    ) -> impl Future<Output = Result<MemberStatus>> + Send;
}

pub use telegram::TelegramClient;

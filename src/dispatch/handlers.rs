//! Per-intent event handlers
//!
//! Each handler runs inside its own spawned task and owns everything it
//! touches except the session store. Every handler asks the authorization
//! gate first and returns silently when refused.

use std::sync::Arc;

use super::commands::{Command, Intent};
use super::replies;
use crate::activity::{ActivityEvent, ActivityLog, InputKind};
use crate::auth::AuthorizationGate;
use crate::completion::CompletionService;
use crate::error::Result;
use crate::platform::MessagingPlatform;
use crate::relay::{StreamRelay, with_format_fallback};
use crate::session::SessionStore;
use crate::types::identifiers::{ChatId, MessageId};
use crate::types::messages::ChatMessage;
use crate::types::options::BotSettings;
use crate::types::updates::IncomingMessage;
use crate::voice::VoicePipeline;

/// Everything a handler needs, shared by all in-flight tasks
pub struct BotContext<P, C> {
    pub(super) platform: Arc<P>,
    pub(super) completion: Arc<C>,
    pub(super) sessions: SessionStore,
    pub(super) gate: AuthorizationGate,
    pub(super) activity: Arc<dyn ActivityLog>,
    pub(super) relay: StreamRelay<P>,
    pub(super) voice: VoicePipeline<P, C>,
    pub(super) settings: BotSettings,
}

impl<P: MessagingPlatform, C: CompletionService> BotContext<P, C> {
    /// Session store shared with the sweeper
    #[must_use]
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Settings in effect
    #[must_use]
    pub fn settings(&self) -> &BotSettings {
        &self.settings
    }

    /// Route a classified event to its handler
    ///
    /// # Errors
    /// Returns error if a reply or the placeholder cannot be delivered
    pub async fn handle(&self, intent: Intent, message: IncomingMessage) -> Result<()> {
        if !self.gate.is_authorized(message.from.id, message.chat).await {
            log::debug!(
                "User {} not authorized in chat {}",
                message.from.id,
                message.chat
            );
            return Ok(());
        }

        match intent {
            Intent::Command(Command::Start) => self.handle_start(&message).await,
            Intent::Command(Command::New) => self.handle_new(&message).await,
            Intent::Command(Command::Help) => self.handle_help(&message).await,
            Intent::Message => self.handle_message(&message).await,
        }
    }

    async fn handle_start(&self, message: &IncomingMessage) -> Result<()> {
        self.activity.record(&message.from, ActivityEvent::BotStart);
        let text = replies::welcome(&self.settings.completion.model);
        self.reply(message.chat, &text).await.map(drop)
    }

    async fn handle_new(&self, message: &IncomingMessage) -> Result<()> {
        self.sessions.get_or_create(message.from.id).clear();
        log::info!("User {} started a new dialog", message.from.id);

        self.activity
            .record(&message.from, ActivityEvent::NewConversation);
        self.reply(message.chat, replies::NEW_DIALOG).await.map(drop)
    }

    async fn handle_help(&self, message: &IncomingMessage) -> Result<()> {
        self.activity.record(&message.from, ActivityEvent::HelpCommand);
        let text = replies::help(&self.settings.support_contact);
        self.reply(message.chat, &text).await.map(drop)
    }

    async fn handle_message(&self, message: &IncomingMessage) -> Result<()> {
        let chat = message.chat;
        let user = message.from.id;

        let (text, kind) = if let Some(file) = message.audio_file() {
            match self.voice.process(file).await {
                Ok(text) => (text, InputKind::Voice),
                Err(e) => {
                    log::error!("Failed to process voice message from user {user}: {e}");
                    return self.reply(chat, replies::VOICE_FAILED).await.map(drop);
                }
            }
        } else if let Some(text) = &message.text {
            (text.clone(), InputKind::Text)
        } else {
            log::debug!("Ignoring message {} without text or voice", message.message_id.get());
            return Ok(());
        };

        let session = self.sessions.get_or_create(user);
        let history = session.push_and_snapshot(ChatMessage::user(text));

        if let Err(e) = self.platform.send_typing(chat).await {
            log::debug!("Failed to send typing indicator to chat {chat}: {e}");
        }

        let request = self.settings.completion.request(history);
        let stream = match self.completion.stream_chat(request).await {
            Ok(stream) => stream,
            Err(e) => {
                log::error!("ChatCompletionStream error for user {user}: {e}");
                return self.reply(chat, replies::COMPLETION_FAILED).await.map(drop);
            }
        };

        let response = self.relay.relay(chat, stream).await?;

        if !response.is_empty() {
            session.push(ChatMessage::assistant(response));
        }

        self.activity
            .record(&message.from, ActivityEvent::MessageSent(kind));
        Ok(())
    }

    /// Send a reply with the Markdown-to-plain fallback and backoff
    async fn reply(&self, chat: ChatId, text: &str) -> Result<MessageId> {
        let platform = &*self.platform;
        with_format_fallback(
            move |mode| platform.send_message(chat, text, mode),
            self.settings.relay.max_attempts,
        )
        .await
    }
}

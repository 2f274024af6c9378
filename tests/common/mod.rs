//! In-memory platform and completion mocks shared by the integration tests

#![allow(dead_code)]

use futures::StreamExt;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;

use chat_relay::completion::{CompletionService, TokenStream};
use chat_relay::platform::{MessagingPlatform, UpdateFeed};
use chat_relay::{
    BotCommand, ChannelRef, ChatId, CompletionRequest, FileId, IncomingMessage, MemberStatus,
    MessageId, ParseMode, RelayError, Result, Sender, Update, UserId,
};

/// Error text the mock uses for rejected markup
pub const MARKUP_REJECTED: &str = "Bad Request: can't parse entities";

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// ============================================================================
// Messaging platform
// ============================================================================

/// One recorded send or edit call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub chat: ChatId,
    pub message: Option<MessageId>,
    pub text: String,
    pub mode: ParseMode,
    pub ok: bool,
}

#[derive(Default)]
pub struct MockPlatform {
    pub sends: Mutex<Vec<Call>>,
    pub edits: Mutex<Vec<Call>>,
    pub typing: AtomicUsize,
    pub commands: Mutex<Vec<BotCommand>>,
    pub members: Mutex<HashMap<UserId, MemberStatus>>,

    pub fail_send: AtomicBool,
    pub reject_markdown: AtomicBool,
    pub fail_download: AtomicBool,
    /// Edits that fail with a flood-control error before succeeding
    pub rate_limited_edits: AtomicU32,
    pub audio: Mutex<Vec<u8>>,

    next_message_id: AtomicU32,
    feed: Mutex<Option<mpsc::UnboundedReceiver<Result<Update>>>>,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self {
            audio: Mutex::new(b"OggS fake voice".to_vec()),
            next_message_id: AtomicU32::new(100),
            ..Self::default()
        }
    }

    /// Attach an update feed driven by the returned sender
    pub fn with_feed(self) -> (Self, mpsc::UnboundedSender<Result<Update>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.feed.lock() = Some(rx);
        (self, tx)
    }

    pub fn successful_edits(&self) -> Vec<Call> {
        self.edits.lock().iter().filter(|c| c.ok).cloned().collect()
    }

    pub fn successful_sends(&self) -> Vec<Call> {
        self.sends.lock().iter().filter(|c| c.ok).cloned().collect()
    }

    fn markup_rejected(&self, mode: ParseMode) -> bool {
        mode == ParseMode::Markdown && self.reject_markdown.load(Ordering::SeqCst)
    }
}

impl MessagingPlatform for MockPlatform {
    async fn send_message(&self, chat: ChatId, text: &str, mode: ParseMode) -> Result<MessageId> {
        let fail = self.fail_send.load(Ordering::SeqCst) || self.markup_rejected(mode);
        let id = MessageId::new(i64::from(self.next_message_id.fetch_add(1, Ordering::SeqCst)));
        self.sends.lock().push(Call {
            chat,
            message: (!fail).then_some(id),
            text: text.to_string(),
            mode,
            ok: !fail,
        });

        if self.fail_send.load(Ordering::SeqCst) {
            return Err(RelayError::platform("Forbidden: bot was blocked by the user"));
        }
        if self.markup_rejected(mode) {
            return Err(RelayError::platform(MARKUP_REJECTED));
        }
        Ok(id)
    }

    async fn edit_message(
        &self,
        chat: ChatId,
        message: MessageId,
        text: &str,
        mode: ParseMode,
    ) -> Result<()> {
        let limited = self
            .rate_limited_edits
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        let rejected = self.markup_rejected(mode);
        let ok = !limited && !rejected;

        self.edits.lock().push(Call {
            chat,
            message: Some(message),
            text: text.to_string(),
            mode,
            ok,
        });

        if limited {
            return Err(RelayError::platform("Too Many Requests: retry after 1"));
        }
        if rejected {
            return Err(RelayError::platform(MARKUP_REJECTED));
        }
        Ok(())
    }

    async fn send_typing(&self, _chat: ChatId) -> Result<()> {
        self.typing.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn updates(&self, _poll_timeout: Duration) -> UpdateFeed {
        match self.feed.lock().take() {
            Some(rx) => futures::stream::unfold(rx, |mut rx| async move {
                rx.recv().await.map(|update| (update, rx))
            })
            .boxed(),
            None => futures::stream::pending::<Result<Update>>().boxed(),
        }
    }

    async fn resolve_file(&self, file: &FileId) -> Result<String> {
        if self.fail_download.load(Ordering::SeqCst) {
            return Err(RelayError::platform("Bad Request: invalid file_id"));
        }
        Ok(format!("mock://files/{}", file.as_str()))
    }

    async fn download_file(&self, _url: &str) -> Result<Vec<u8>> {
        Ok(self.audio.lock().clone())
    }

    async fn set_commands(&self, commands: &[BotCommand]) -> Result<()> {
        *self.commands.lock() = commands.to_vec();
        Ok(())
    }

    async fn chat_member_status(&self, _channel: &ChannelRef, user: UserId) -> Result<MemberStatus> {
        self.members
            .lock()
            .get(&user)
            .cloned()
            .ok_or_else(|| RelayError::platform("Bad Request: user not found"))
    }
}

// ============================================================================
// Completion service
// ============================================================================

/// Scripted generation returned by the next `stream_chat` call
#[derive(Debug, Clone, Default)]
pub struct Script {
    pub tokens: Vec<String>,
    pub interval: Duration,
    /// Emit the first token without waiting for the interval
    pub first_immediate: bool,
    pub error_after: Option<String>,
}

impl Script {
    pub fn tokens(tokens: &[&str]) -> Self {
        Self {
            tokens: tokens.iter().map(|t| (*t).to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn every(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn starting_now(mut self) -> Self {
        self.first_immediate = true;
        self
    }

    pub fn then_fail(mut self, message: &str) -> Self {
        self.error_after = Some(message.to_string());
        self
    }

    pub fn into_stream(self) -> TokenStream {
        let Script {
            tokens,
            interval,
            first_immediate,
            error_after,
        } = self;
        async_stream::stream! {
            for (i, token) in tokens.into_iter().enumerate() {
                if !interval.is_zero() && !(first_immediate && i == 0) {
                    tokio::time::sleep(interval).await;
                }
                yield Ok(token);
            }
            if let Some(message) = error_after {
                yield Err(RelayError::stream(message));
            }
        }
        .boxed()
    }
}

#[derive(Default)]
pub struct MockCompletion {
    pub scripts: Mutex<VecDeque<Script>>,
    pub requests: Mutex<Vec<CompletionRequest>>,
    pub fail_open: AtomicBool,

    pub transcript: Mutex<Option<String>>,
    pub transcriptions: Mutex<Vec<(usize, String, String)>>,
}

impl MockCompletion {
    pub fn new() -> Self {
        Self {
            transcript: Mutex::new(Some("transcribed words".to_string())),
            ..Self::default()
        }
    }

    pub fn push(&self, script: Script) {
        self.scripts.lock().push_back(script);
    }
}

impl CompletionService for MockCompletion {
    async fn stream_chat(&self, request: CompletionRequest) -> Result<TokenStream> {
        self.requests.lock().push(request);
        if self.fail_open.load(Ordering::SeqCst) {
            return Err(RelayError::completion("HTTP 500 Internal Server Error: boom"));
        }
        let script = self.scripts.lock().pop_front().unwrap_or_default();
        Ok(script.into_stream())
    }

    async fn transcribe(&self, audio: Vec<u8>, file_name: &str, language: &str) -> Result<String> {
        self.transcriptions
            .lock()
            .push((audio.len(), file_name.to_string(), language.to_string()));
        self.transcript
            .lock()
            .clone()
            .ok_or_else(|| RelayError::transcription("HTTP 400 Bad Request: invalid audio"))
    }
}

// ============================================================================
// Event builders
// ============================================================================

pub fn sender(id: i64) -> Sender {
    Sender {
        id: UserId::new(id),
        username: Some(format!("user{id}")),
        first_name: format!("User {id}"),
    }
}

pub fn text_message(user: i64, text: &str) -> IncomingMessage {
    IncomingMessage {
        message_id: MessageId::new(1),
        chat: ChatId::new(user),
        from: sender(user),
        text: Some(text.to_string()),
        voice: None,
        video_note: None,
    }
}

pub fn voice_message(user: i64, file: &str) -> IncomingMessage {
    IncomingMessage {
        text: None,
        voice: Some(FileId::new(file)),
        ..text_message(user, "")
    }
}

pub fn update(update_id: i64, message: IncomingMessage) -> Update {
    Update {
        update_id,
        message: Some(message),
    }
}

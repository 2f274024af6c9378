//! Telegram Bot API client
//!
//! Thin JSON-over-HTTP client for the handful of Bot API methods the relay
//! needs. Responses arrive in the `{ok, result, description, parameters}`
//! envelope; a non-ok envelope becomes [`RelayError::Platform`] carrying
//! the description, with the retry hint appended when only the structured
//! `retry_after` field has it.

use futures::StreamExt;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

use super::{MessagingPlatform, UpdateFeed};
use crate::error::{RelayError, Result};
use crate::types::identifiers::{ChannelRef, ChatId, FileId, MessageId, UserId};
use crate::types::updates::{
    BotCommand, IncomingMessage, MemberStatus, ParseMode, Sender, Update,
};

/// Default Bot API endpoint
pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

/// Pause before polling again after a failed `getUpdates`
const POLL_ERROR_PAUSE: Duration = Duration::from_secs(1);

/// Extra HTTP timeout on top of the long-poll timeout
const POLL_TIMEOUT_MARGIN: Duration = Duration::from_secs(10);

/// Edits that change nothing are rejected with this description
const NOT_MODIFIED: &str = "message is not modified";

// ============================================================================
// Client
// ============================================================================

/// Telegram Bot API client
#[derive(Clone)]
pub struct TelegramClient {
    http: Client,
    api_url: String,
    token: String,
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramClient")
            .field("api_url", &self.api_url)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl TelegramClient {
    /// Create a client for the given bot token
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built
    pub fn new(token: impl Into<String>, api_url: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            http,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.api_url, self.token)
    }

    /// Call a Bot API method and decode its `result`
    async fn call<T, B>(&self, method: &str, body: &B, timeout: Option<Duration>) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let mut request = self.http.post(self.method_url(method)).json(body);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let envelope: ApiResponse<T> = request.send().await?.json().await?;
        envelope.into_result(method)
    }

    async fn get_updates(&self, offset: i64, poll_timeout: Duration) -> Result<Vec<TgUpdate>> {
        let body = json!({
            "offset": offset,
            "timeout": poll_timeout.as_secs(),
            "allowed_updates": ["message"],
        });
        self.call("getUpdates", &body, Some(poll_timeout + POLL_TIMEOUT_MARGIN))
            .await
    }
}

impl MessagingPlatform for TelegramClient {
    async fn send_message(&self, chat: ChatId, text: &str, mode: ParseMode) -> Result<MessageId> {
        let body = OutgoingText {
            chat_id: chat.get(),
            message_id: None,
            text,
            parse_mode: mode.as_wire(),
        };
        let sent: TgMessage = self.call("sendMessage", &body, None).await?;
        Ok(MessageId::new(sent.message_id))
    }

    async fn edit_message(
        &self,
        chat: ChatId,
        message: MessageId,
        text: &str,
        mode: ParseMode,
    ) -> Result<()> {
        let body = OutgoingText {
            chat_id: chat.get(),
            message_id: Some(message.get()),
            text,
            parse_mode: mode.as_wire(),
        };
        match self
            .call::<serde_json::Value, _>("editMessageText", &body, None)
            .await
        {
            Ok(_) => Ok(()),
            Err(RelayError::Platform(description)) if description.contains(NOT_MODIFIED) => {
                log::debug!("Edit of message {} skipped: text unchanged", message.get());
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn send_typing(&self, chat: ChatId) -> Result<()> {
        let body = json!({ "chat_id": chat.get(), "action": "typing" });
        self.call::<bool, _>("sendChatAction", &body, None).await?;
        Ok(())
    }

    fn updates(&self, poll_timeout: Duration) -> UpdateFeed {
        let client = self.clone();
        async_stream::stream! {
            let mut offset = 0_i64;
            loop {
                match client.get_updates(offset, poll_timeout).await {
                    Ok(batch) => {
                        for raw in batch {
                            offset = offset.max(raw.update_id + 1);
                            yield Ok(raw.into_update());
                        }
                    }
                    Err(e) => {
                        yield Err(e);
                        tokio::time::sleep(POLL_ERROR_PAUSE).await;
                    }
                }
            }
        }
        .boxed()
    }

    async fn resolve_file(&self, file: &FileId) -> Result<String> {
        let body = json!({ "file_id": file.as_str() });
        let resolved: TgFile = self.call("getFile", &body, None).await?;
        let path = resolved
            .file_path
            .ok_or_else(|| RelayError::platform(format!("file {} has no path", file.as_str())))?;
        Ok(format!("{}/file/bot{}/{path}", self.api_url, self.token))
    }

    async fn download_file(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RelayError::platform(format!(
                "file download failed with status {status}"
            )));
        }
        Ok(response.bytes().await?.to_vec())
    }

    async fn set_commands(&self, commands: &[BotCommand]) -> Result<()> {
        let body = json!({ "commands": commands });
        self.call::<bool, _>("setMyCommands", &body, None).await?;
        Ok(())
    }

    async fn chat_member_status(&self, channel: &ChannelRef, user: UserId) -> Result<MemberStatus> {
        let chat_id = match channel {
            ChannelRef::Id(id) => json!(id),
            ChannelRef::Username(name) => json!(name),
        };
        let body = json!({ "chat_id": chat_id, "user_id": user.get() });
        let member: TgChatMember = self.call("getChatMember", &body, None).await?;
        Ok(MemberStatus::parse(&member.status))
    }
}

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
    parameters: Option<ResponseParameters>,
}

#[derive(Deserialize)]
struct ResponseParameters {
    retry_after: Option<u64>,
}

impl<T> ApiResponse<T> {
    fn into_result(self, method: &str) -> Result<T> {
        if self.ok {
            return self
                .result
                .ok_or_else(|| RelayError::platform(format!("{method}: missing result")));
        }

        let mut description = self
            .description
            .unwrap_or_else(|| format!("{method} failed"));
        if let Some(secs) = self.parameters.and_then(|p| p.retry_after)
            && !description.contains("retry after")
        {
            description.push_str(&format!(": retry after {secs}"));
        }
        Err(RelayError::Platform(description))
    }
}

#[derive(Serialize)]
struct OutgoingText<'a> {
    chat_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    message_id: Option<i64>,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'static str>,
}

#[derive(Deserialize)]
struct TgUpdate {
    update_id: i64,
    message: Option<TgMessage>,
}

impl TgUpdate {
    fn into_update(self) -> Update {
        Update {
            update_id: self.update_id,
            message: self.message.and_then(TgMessage::into_incoming),
        }
    }
}

#[derive(Deserialize)]
struct TgMessage {
    message_id: i64,
    from: Option<TgUser>,
    chat: TgChat,
    text: Option<String>,
    voice: Option<TgFileRef>,
    video_note: Option<TgFileRef>,
}

impl TgMessage {
    /// Channel posts and service messages without an author are dropped
    fn into_incoming(self) -> Option<IncomingMessage> {
        let from = self.from?;
        Some(IncomingMessage {
            message_id: MessageId::new(self.message_id),
            chat: ChatId::new(self.chat.id),
            from: Sender {
                id: UserId::new(from.id),
                username: from.username,
                first_name: from.first_name,
            },
            text: self.text,
            voice: self.voice.map(|v| FileId::new(v.file_id)),
            video_note: self.video_note.map(|v| FileId::new(v.file_id)),
        })
    }
}

#[derive(Deserialize)]
struct TgUser {
    id: i64,
    username: Option<String>,
    #[serde(default)]
    first_name: String,
}

#[derive(Deserialize)]
struct TgChat {
    id: i64,
}

#[derive(Deserialize)]
struct TgFileRef {
    file_id: String,
}

#[derive(Deserialize)]
struct TgFile {
    file_path: Option<String>,
}

#[derive(Deserialize)]
struct TgChatMember {
    status: String,
}

//! # Chat Relay
//!
//! A conversational relay bot: messages arriving from a chat platform are
//! answered by a streaming completion service, and each answer is shown to
//! the user as a single message that is edited live while tokens arrive.
//!
//! ## Quick Start
//!
//! ```no_run
//! use chat_relay::{Config, Dispatcher, OpenAiClient, TelegramClient};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> chat_relay::Result<()> {
//! let config = Config::from_env()?;
//! let platform = Arc::new(TelegramClient::new(&config.bot_token, &config.telegram_api_url)?);
//! let completion = Arc::new(OpenAiClient::new(&config.openai_api_key, &config.openai_base_url)?);
//!
//! let dispatcher = Dispatcher::builder(platform, completion)
//!     .settings(config.bot_settings())
//!     .build();
//!
//! dispatcher.run(CancellationToken::new()).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`session`]: Per-user conversation history with inactivity reset and sweep
//! - [`relay`]: Token stream to throttled message edits
//! - [`backoff`]: Retry of flood-controlled platform calls
//! - [`dispatch`]: Event intake loop and per-intent handlers
//! - [`voice`]: Voice attachment download and transcription
//! - [`platform`]: Messaging platform seam and the Telegram client
//! - [`completion`]: Completion service seam and the OpenAI client
//! - [`auth`]: Authorization gate consulted by every handler
//! - [`activity`]: Fire-and-forget activity log
//! - [`config`]: Environment configuration
//! - [`error`]: Error types and handling
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T, RelayError>`](Result). Errors
//! from one user's handler are logged inside that handler's task and never
//! reach the dispatch loop.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod activity;
pub mod auth;
pub mod backoff;
pub mod completion;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod platform;
pub mod relay;
pub mod session;
pub mod types;
pub mod voice;

// Re-export commonly used types for external API
pub use activity::{ActivityEvent, ActivityLog, InputKind, LogActivityLog};
pub use auth::{AuthorizationCallback, AuthorizationGate};
pub use backoff::{retry_after, retry_with_backoff};
pub use completion::{CompletionService, OpenAiClient, TokenStream};
pub use config::Config;
pub use dispatch::{BotContext, Dispatcher, DispatcherBuilder};
pub use error::{RelayError, Result};
pub use platform::{MessagingPlatform, TelegramClient, UpdateFeed};
pub use relay::{StreamRelay, with_format_fallback};
pub use session::{Session, SessionStore};
pub use voice::VoicePipeline;

// Re-export type submodules for flat public API
pub use types::identifiers::{ChannelRef, ChatId, FileId, MessageId, UserId};
pub use types::messages::{ChatMessage, CompletionRequest, Role};
pub use types::options::{BotSettings, BotSettingsBuilder, CompletionOptions, RelayOptions};
pub use types::updates::{
    BotCommand, IncomingMessage, MemberStatus, ParseMode, Sender, Update,
};

/// Version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

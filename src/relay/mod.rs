//! Streaming-response relay
//!
//! Drives a completion token stream to its end while keeping one visible
//! message up to date: a placeholder is sent first, throttled edits carry
//! the accumulated text while tokens arrive, and a final edit carries the
//! complete answer.
//!
//! # Module Structure
//!
//! - `throttle` - Edit throttle state machine
//! - `format` - Markdown-to-plain fallback shared with handler replies

mod format;
mod throttle;

use futures::StreamExt;
use std::sync::Arc;
use tokio::time::Instant;

use crate::completion::TokenStream;
use crate::error::Result;
use crate::platform::MessagingPlatform;
use crate::types::identifiers::{ChatId, MessageId};
use crate::types::options::RelayOptions;
use crate::types::updates::ParseMode;

pub use format::with_format_fallback;
pub use throttle::{EditThrottle, FlushState};

/// Relay from a token stream into a single progressively edited message
pub struct StreamRelay<P> {
    platform: Arc<P>,
    options: RelayOptions,
}

impl<P> Clone for StreamRelay<P> {
    fn clone(&self) -> Self {
        Self {
            platform: Arc::clone(&self.platform),
            options: self.options.clone(),
        }
    }
}

impl<P: MessagingPlatform> StreamRelay<P> {
    /// Create a relay over the given platform
    pub fn new(platform: Arc<P>, options: RelayOptions) -> Self {
        Self { platform, options }
    }

    /// Relay options in effect
    #[must_use]
    pub fn options(&self) -> &RelayOptions {
        &self.options
    }

    /// Stream a reply into `chat` and return the accumulated text
    ///
    /// A stream read error ends the generation early; whatever arrived
    /// before it is treated as the final answer. Edit failures are logged
    /// and never abort the relay. An empty result means the stream produced
    /// no content and no final edit was issued.
    ///
    /// # Errors
    /// Returns error only if the placeholder message cannot be sent
    pub async fn relay(&self, chat: ChatId, mut stream: TokenStream) -> Result<String> {
        let handle = self
            .platform
            .send_message(chat, &self.options.placeholder, ParseMode::Plain)
            .await?;

        let mut response = String::new();
        let mut throttle = EditThrottle::new(self.options.edit_interval);

        while let Some(next) = stream.next().await {
            let increment = match next {
                Ok(increment) => increment,
                Err(e) => {
                    log::warn!("Error receiving stream for chat {chat}: {e}");
                    break;
                }
            };
            if increment.is_empty() {
                continue;
            }

            response.push_str(&increment);

            if throttle.on_increment(Instant::now()) == FlushState::FlushEligible {
                self.edit(chat, handle, &response).await;
                throttle.on_flush(Instant::now());
            }
        }
        drop(stream);
        throttle.on_end();

        if response.is_empty() {
            log::warn!("Completion stream for chat {chat} produced no content");
            return Ok(response);
        }

        self.edit(chat, handle, &response).await;
        throttle.on_flush(Instant::now());

        Ok(response)
    }

    /// Edit the outgoing message, logging a failure of both formatting attempts
    async fn edit(&self, chat: ChatId, handle: MessageId, text: &str) {
        let platform = &*self.platform;
        let result = with_format_fallback(
            move |mode| platform.edit_message(chat, handle, text, mode),
            self.options.max_attempts,
        )
        .await;

        if let Err(e) = result {
            log::error!("Failed to edit message {} in chat {chat}: {e}", handle.get());
        }
    }
}

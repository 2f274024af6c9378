//! Authorization gate for handlers
//!
//! Every handler asks the gate before doing any work. The gate wraps a
//! swappable async predicate over `(user, chat)`; the default lets everyone
//! through and the channel-membership policy is available for deployments
//! that require a subscription.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::platform::MessagingPlatform;
use crate::types::identifiers::{ChannelRef, ChatId, UserId};
use crate::types::updates::ParseMode;

/// Async predicate deciding whether a user may use the bot in a chat
pub type AuthorizationCallback = Arc<
    dyn Fn(UserId, ChatId) -> Pin<Box<dyn Future<Output = bool> + Send>> + Send + Sync,
>;

/// Swappable authorization policy
#[derive(Clone)]
pub struct AuthorizationGate {
    callback: Option<AuthorizationCallback>,
}

impl std::fmt::Debug for AuthorizationGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizationGate")
            .field(
                "callback",
                &self.callback.as_ref().map_or("<allow all>", |_| "<callback>"),
            )
            .finish()
    }
}

impl AuthorizationGate {
    /// Gate that authorizes every user
    #[must_use]
    pub const fn allow_all() -> Self {
        Self { callback: None }
    }

    /// Gate backed by an arbitrary async predicate
    pub fn callback<F, Fut>(f: F) -> Self
    where
        F: Fn(UserId, ChatId) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        Self {
            callback: Some(Arc::new(move |user, chat| Box::pin(f(user, chat)))),
        }
    }

    /// Gate requiring membership in `channel`
    ///
    /// Users who left or were removed, and users whose status cannot be
    /// looked up, are refused; `notice` is sent to their chat.
    pub fn channel_membership<P: MessagingPlatform>(
        platform: Arc<P>,
        channel: ChannelRef,
        notice: impl Into<String>,
    ) -> Self {
        let channel = Arc::new(channel);
        let notice: Arc<str> = Arc::from(notice.into());

        Self::callback(move |user, chat| {
            let platform = Arc::clone(&platform);
            let channel = Arc::clone(&channel);
            let notice = Arc::clone(&notice);
            async move {
                let subscribed = match platform.chat_member_status(&channel, user).await {
                    Ok(status) => status.is_subscribed(),
                    Err(e) => {
                        log::error!("Error getting chat member {user} of {channel}: {e}");
                        false
                    }
                };

                if !subscribed
                    && let Err(e) = platform.send_message(chat, &notice, ParseMode::Plain).await
                {
                    log::warn!("Failed to send subscription notice to chat {chat}: {e}");
                }
                subscribed
            }
        })
    }

    /// Whether `user` may proceed in `chat`
    pub async fn is_authorized(&self, user: UserId, chat: ChatId) -> bool {
        match &self.callback {
            None => true,
            Some(callback) => callback(user, chat).await,
        }
    }
}

impl Default for AuthorizationGate {
    fn default() -> Self {
        Self::allow_all()
    }
}

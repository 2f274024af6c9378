//! Dispatch loop
//!
//! Pulls inbound events from the platform feed and hands each one to an
//! independent task, so a slow generation for one user never holds up
//! intake for others. The loop ends when its cancellation token fires or
//! the feed closes; tasks already spawned run to completion.
//!
//! # Module Structure
//!
//! - `commands` - Intent classification and the command menu
//! - `handlers` - Per-intent handlers over the shared [`BotContext`]
//! - `replies` - User-facing reply texts

pub mod commands;
mod handlers;
pub mod replies;

use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::activity::{ActivityLog, LogActivityLog};
use crate::auth::AuthorizationGate;
use crate::completion::CompletionService;
use crate::error::Result;
use crate::platform::MessagingPlatform;
use crate::relay::StreamRelay;
use crate::session::{SWEEP_INTERVAL, SessionStore};
use crate::types::options::BotSettings;
use crate::types::updates::Update;
use crate::voice::VoicePipeline;

pub use commands::{Command, Intent, classify, command_menu};
pub use handlers::BotContext;

/// Long-poll timeout for the update feed
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(60);

// ============================================================================
// DISPATCHER
// ============================================================================

/// Event intake loop and task fan-out
pub struct Dispatcher<P, C> {
    context: Arc<BotContext<P, C>>,
    poll_timeout: Duration,
    sweep_interval: Duration,
    limiter: Option<Arc<Semaphore>>,
}

impl<P: MessagingPlatform, C: CompletionService> Dispatcher<P, C> {
    /// Start building a dispatcher over the given collaborators
    pub fn builder(platform: Arc<P>, completion: Arc<C>) -> DispatcherBuilder<P, C> {
        DispatcherBuilder::new(platform, completion)
    }

    /// Shared handler context
    #[must_use]
    pub fn context(&self) -> &Arc<BotContext<P, C>> {
        &self.context
    }

    /// Run until `cancel` fires or the update feed closes
    ///
    /// Installs the command menu, starts the session sweeper, then
    /// dispatches every inbound event. Feed errors are logged and never end
    /// the loop. The sweeper is stopped before returning.
    ///
    /// # Errors
    /// Currently infallible; the result leaves room for startup failures
    pub async fn run(&self, cancel: CancellationToken) -> Result<()> {
        if let Err(e) = self
            .context
            .platform
            .set_commands(&command_menu())
            .await
        {
            log::error!("Failed to set bot commands: {e}");
        }

        let sweeper_cancel = cancel.child_token();
        let sweeper = self
            .context
            .sessions
            .spawn_sweeper(self.sweep_interval, sweeper_cancel.clone());

        let mut feed = self.context.platform.updates(self.poll_timeout);
        log::info!("Dispatch loop started");

        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    log::info!("Dispatch loop cancelled");
                    break;
                }
                next = feed.next() => match next {
                    Some(Ok(update)) => {
                        self.dispatch(update);
                    }
                    Some(Err(e)) => {
                        log::warn!("Error receiving updates: {e}");
                    }
                    None => {
                        log::info!("Update feed closed");
                        break;
                    }
                },
            }
        }

        drop(feed);
        sweeper_cancel.cancel();
        if let Err(e) = sweeper.await {
            log::error!("Session sweeper task failed: {e}");
        }
        Ok(())
    }

    /// Classify one event and spawn its handler
    ///
    /// Returns `None` for events nobody handles (no message, unknown
    /// command). The returned handle may be dropped; the task keeps
    /// running detached.
    pub fn dispatch(&self, update: Update) -> Option<JoinHandle<()>> {
        let update_id = update.update_id;
        let Some((intent, message)) = classify(update) else {
            log::debug!("Ignoring update {update_id}");
            return None;
        };

        let context = Arc::clone(&self.context);
        let limiter = self.limiter.clone();

        Some(tokio::spawn(async move {
            let _permit = match limiter {
                Some(limiter) => match limiter.acquire_owned().await {
                    Ok(permit) => Some(permit),
                    Err(_) => return,
                },
                None => None,
            };

            let user = message.from.id;
            if let Err(e) = context.handle(intent, message).await {
                log::error!("Handler for update {update_id} (user {user}) failed: {e}");
            }
        }))
    }
}

// ============================================================================
// BUILDER
// ============================================================================

/// Builder for [`Dispatcher`]
pub struct DispatcherBuilder<P, C> {
    platform: Arc<P>,
    completion: Arc<C>,
    settings: BotSettings,
    sessions: SessionStore,
    gate: AuthorizationGate,
    activity: Arc<dyn ActivityLog>,
    poll_timeout: Duration,
    sweep_interval: Duration,
    max_concurrent: Option<usize>,
}

impl<P: MessagingPlatform, C: CompletionService> DispatcherBuilder<P, C> {
    fn new(platform: Arc<P>, completion: Arc<C>) -> Self {
        Self {
            platform,
            completion,
            settings: BotSettings::default(),
            sessions: SessionStore::new(),
            gate: AuthorizationGate::allow_all(),
            activity: Arc::new(LogActivityLog),
            poll_timeout: DEFAULT_POLL_TIMEOUT,
            sweep_interval: SWEEP_INTERVAL,
            max_concurrent: None,
        }
    }

    /// Set the handler settings
    #[must_use]
    pub fn settings(mut self, settings: BotSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Use an existing session store
    #[must_use]
    pub fn sessions(mut self, sessions: SessionStore) -> Self {
        self.sessions = sessions;
        self
    }

    /// Set the authorization gate
    #[must_use]
    pub fn gate(mut self, gate: AuthorizationGate) -> Self {
        self.gate = gate;
        self
    }

    /// Set the activity log sink
    #[must_use]
    pub fn activity(mut self, activity: Arc<dyn ActivityLog>) -> Self {
        self.activity = activity;
        self
    }

    /// Set the update feed's long-poll timeout
    #[must_use]
    pub const fn poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    /// Set the interval between session sweeps
    #[must_use]
    pub const fn sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Bound the number of handlers running at once
    ///
    /// `None` (the default) leaves fan-out unbounded. Intake never waits on
    /// the bound; excess tasks wait inside themselves.
    #[must_use]
    pub const fn max_concurrent(mut self, limit: Option<usize>) -> Self {
        self.max_concurrent = limit;
        self
    }

    /// Build the dispatcher
    #[must_use]
    pub fn build(self) -> Dispatcher<P, C> {
        let relay = StreamRelay::new(Arc::clone(&self.platform), self.settings.relay.clone());
        let voice = VoicePipeline::new(
            Arc::clone(&self.platform),
            Arc::clone(&self.completion),
            self.settings.transcription_language.clone(),
        );

        let context = BotContext {
            platform: self.platform,
            completion: self.completion,
            sessions: self.sessions,
            gate: self.gate,
            activity: self.activity,
            relay,
            voice,
            settings: self.settings,
        };

        Dispatcher {
            context: Arc::new(context),
            poll_timeout: self.poll_timeout,
            sweep_interval: self.sweep_interval,
            limiter: self
                .max_concurrent
                .map(|limit| Arc::new(Semaphore::new(limit.max(1)))),
        }
    }
}

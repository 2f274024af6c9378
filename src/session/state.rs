//! Per-user conversation state
//!
//! A [`Session`] owns the ordered history of one user and the time it was
//! last touched. Its content sits behind its own lock, separate from the
//! store's map lock, so two users never contend on each other's history.

use parking_lot::RwLock;
use std::time::Duration;
use tokio::time::Instant;

use crate::types::identifiers::UserId;
use crate::types::messages::ChatMessage;

/// Mutable content of a session
#[derive(Debug)]
struct SessionState {
    messages: Vec<ChatMessage>,
    last_activity: Instant,
}

/// Conversation session for a single user
///
/// Shared as `Arc<Session>`; the object keeps its identity for as long as
/// anyone holds it, even across inactivity resets.
#[derive(Debug)]
pub struct Session {
    user_id: UserId,
    state: RwLock<SessionState>,
}

impl Session {
    pub(super) fn new(user_id: UserId, now: Instant) -> Self {
        Self {
            user_id,
            state: RwLock::new(SessionState {
                messages: Vec::new(),
                last_activity: now,
            }),
        }
    }

    /// Owner of this session
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Snapshot of the history in insertion order
    #[must_use]
    pub fn history(&self) -> Vec<ChatMessage> {
        self.state.read().messages.clone()
    }

    /// Number of entries in the history
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().messages.len()
    }

    /// Whether the history is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.read().messages.is_empty()
    }

    /// Time of the last access or mutation
    #[must_use]
    pub fn last_activity(&self) -> Instant {
        self.state.read().last_activity
    }

    /// Append an entry and mark the session active
    pub fn push(&self, message: ChatMessage) {
        let mut state = self.state.write();
        state.messages.push(message);
        state.last_activity = Instant::now();
    }

    /// Append an entry and return the resulting history in one critical section
    ///
    /// The returned snapshot is exactly what a completion request for this
    /// turn should replay.
    pub fn push_and_snapshot(&self, message: ChatMessage) -> Vec<ChatMessage> {
        let mut state = self.state.write();
        state.messages.push(message);
        state.last_activity = Instant::now();
        state.messages.clone()
    }

    /// Drop the whole history and mark the session active
    pub fn clear(&self) {
        let mut state = self.state.write();
        state.messages = Vec::new();
        state.last_activity = Instant::now();
    }

    /// Reset the history if idle past `ttl`, then mark the session active
    ///
    /// Returns whether a reset happened.
    pub(super) fn touch(&self, now: Instant, ttl: Duration) -> bool {
        let mut state = self.state.write();
        let expired = now.saturating_duration_since(state.last_activity) > ttl;
        if expired {
            state.messages = Vec::new();
        }
        state.last_activity = now;
        expired
    }

    /// Whether the session has been idle past `ttl`
    pub(super) fn is_inactive(&self, now: Instant, ttl: Duration) -> bool {
        let state = self.state.read();
        now.saturating_duration_since(state.last_activity) > ttl
    }
}

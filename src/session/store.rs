//! Session store with two-level locking
//!
//! The store lock guards only the shape of the map (inserts and removals)
//! and is held for a lookup or a sweep pass. Each session's content is
//! guarded by the session's own lock.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use super::state::Session;
use crate::types::identifiers::UserId;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Idle time after which a session's history is reset (3 minutes)
pub const INACTIVITY_THRESHOLD: Duration = Duration::from_secs(3 * 60);

// ============================================================================
// SESSION STORE
// ============================================================================

struct StoreInner {
    sessions: Mutex<HashMap<UserId, Arc<Session>>>,
    ttl: Duration,
}

/// Concurrent mapping from user identity to conversation session
///
/// Cheap to clone; clones share the same map.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<StoreInner>,
}

impl SessionStore {
    /// Create an empty store with the default inactivity threshold
    #[must_use]
    pub fn new() -> Self {
        Self::with_ttl(INACTIVITY_THRESHOLD)
    }

    /// Create an empty store with a custom inactivity threshold
    #[must_use]
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                sessions: Mutex::new(HashMap::new()),
                ttl,
            }),
        }
    }

    /// Inactivity threshold applied by this store
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.inner.ttl
    }

    /// Fetch the user's session, creating it on first access
    ///
    /// An existing session idle for longer than the threshold has its
    /// history cleared in place; the returned `Arc` is the same object any
    /// other holder already has. Last activity is refreshed either way.
    pub fn get_or_create(&self, user_id: UserId) -> Arc<Session> {
        let now = Instant::now();
        let mut sessions = self.inner.sessions.lock();

        if let Some(session) = sessions.get(&user_id) {
            if session.touch(now, self.inner.ttl) {
                log::info!("Resetting context for user {user_id} due to inactivity");
            }
            return Arc::clone(session);
        }

        log::info!("Creating new context for user {user_id}");
        let session = Arc::new(Session::new(user_id, now));
        sessions.insert(user_id, Arc::clone(&session));
        session
    }

    /// Look up a session without creating or touching it
    #[must_use]
    pub fn get(&self, user_id: UserId) -> Option<Arc<Session>> {
        self.inner.sessions.lock().get(&user_id).cloned()
    }

    /// Remove every session idle past the threshold
    ///
    /// Returns the number of sessions removed.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let ttl = self.inner.ttl;
        let mut sessions = self.inner.sessions.lock();
        let before = sessions.len();

        sessions.retain(|user_id, session| {
            let keep = !session.is_inactive(now, ttl);
            if !keep {
                log::info!("Cleaned context for user {user_id}");
            }
            keep
        });

        before - sessions.len()
    }

    /// Number of live sessions
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.sessions.lock().len()
    }

    /// Whether the store holds no sessions
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.sessions.lock().is_empty()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

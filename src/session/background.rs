//! Background sweep task for the session store
//!
//! The sweeper talks to request handlers only through the store's own
//! synchronized operations.

use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::store::SessionStore;

/// Interval between sweep passes (1 minute)
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

impl SessionStore {
    /// Spawn a task that sweeps inactive sessions every `interval`
    ///
    /// The task runs until `cancel` fires. The first pass happens one full
    /// interval after spawning.
    pub fn spawn_sweeper(&self, interval: Duration, cancel: CancellationToken) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    () = cancel.cancelled() => {
                        log::debug!("Session sweeper stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        let removed = store.sweep();
                        if removed > 0 {
                            log::debug!("Swept {removed} inactive session(s)");
                        }
                    }
                }
            }
        })
    }
}

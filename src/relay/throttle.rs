//! Edit throttle state machine
//!
//! ```text
//!   Accumulating ──interval elapsed──▶ FlushEligible ──edit──▶ Flushed
//!        ▲                                                       │
//!        └───────────────────────── next increment ◀─────────────┘
//!
//!   any state ──stream ended──▶ Ended (one unconditional flush)
//! ```
//!
//! The throttle never sleeps; it only answers whether an edit may be issued
//! now, keyed off the time of the previous edit attempt.

use std::time::Duration;
use tokio::time::Instant;

/// Where the relay stands with respect to its next edit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushState {
    /// Text is pending but the interval since the last edit has not elapsed
    Accumulating,
    /// Text is pending and an edit may be issued now
    FlushEligible,
    /// Everything accumulated so far has been sent
    Flushed,
    /// The stream is over; the final flush is owed unconditionally
    Ended,
}

/// Throttle deciding when the outgoing message may be edited
#[derive(Debug)]
pub struct EditThrottle {
    interval: Duration,
    last_edit: Option<Instant>,
    state: FlushState,
}

impl EditThrottle {
    /// Create a throttle that allows the very first edit immediately
    #[must_use]
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_edit: None,
            state: FlushState::Flushed,
        }
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> FlushState {
        self.state
    }

    /// Register newly accumulated text and report the resulting state
    pub fn on_increment(&mut self, now: Instant) -> FlushState {
        if self.state == FlushState::Ended {
            return self.state;
        }
        let eligible = self
            .last_edit
            .is_none_or(|last| now.saturating_duration_since(last) > self.interval);
        self.state = if eligible {
            FlushState::FlushEligible
        } else {
            FlushState::Accumulating
        };
        self.state
    }

    /// Record an edit attempt made at `now`
    pub fn on_flush(&mut self, now: Instant) {
        self.last_edit = Some(now);
        if self.state != FlushState::Ended {
            self.state = FlushState::Flushed;
        }
    }

    /// Mark the stream as finished
    pub fn on_end(&mut self) {
        self.state = FlushState::Ended;
    }
}

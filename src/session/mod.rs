//! Conversation session management
//!
//! Provides `SessionStore` for creating, resetting and evicting per-user
//! conversation sessions under concurrent access.
//!
//! # Module Structure
//!
//! - `state` - Per-user session state behind its own lock
//! - `store` - The user-to-session map and its locking discipline
//! - `background` - Periodic sweep task

mod background;
mod state;
mod store;

pub use background::SWEEP_INTERVAL;
pub use state::Session;
pub use store::{INACTIVITY_THRESHOLD, SessionStore};

//! Conversation message types
//!
//! Role-tagged history entries and the completion request built from them.

use serde::{Deserialize, Serialize};

// ============================================================================
// Conversation History
// ============================================================================

/// Author of a history entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Message written by the user
    User,
    /// Message generated by the model
    Assistant,
}

/// One role-tagged entry of a session's history
///
/// Serializes directly into the chat-completions `messages` format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who wrote the entry
    pub role: Role,
    /// Entry text
    pub content: String,
}

impl ChatMessage {
    /// Create a user turn
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant turn
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

// ============================================================================
// Completion Request
// ============================================================================

/// Request body for a streamed chat completion
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    /// Model identifier
    pub model: String,
    /// Full ordered session history
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature
    pub temperature: f32,
    /// Maximum generated tokens
    pub max_tokens: u32,
    /// Always true on the relay path
    pub stream: bool,
}

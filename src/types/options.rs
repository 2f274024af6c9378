//! Relay options and configuration
//!
//! This module contains the runtime settings consumed by the handlers,
//! including a builder pattern for easy configuration.

use std::time::Duration;

use super::messages::{ChatMessage, CompletionRequest};

/// Minimum spacing between successive edits of a streamed reply
pub const DEFAULT_EDIT_INTERVAL: Duration = Duration::from_millis(500);

/// Attempt budget for rate-limited messaging calls
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

// ============================================================================
// Completion Options
// ============================================================================

/// Parameters of every completion request
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionOptions {
    /// Model identifier
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Maximum generated tokens
    pub max_tokens: u32,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            temperature: 0.7,
            max_tokens: 2000,
        }
    }
}

impl CompletionOptions {
    /// Build a streaming request over the given history
    #[must_use]
    pub fn request(&self, messages: Vec<ChatMessage>) -> CompletionRequest {
        CompletionRequest {
            model: self.model.clone(),
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stream: true,
        }
    }
}

// ============================================================================
// Relay Options
// ============================================================================

/// Tuning of the stream relay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayOptions {
    /// Minimum spacing between throttled edits
    pub edit_interval: Duration,
    /// Text of the placeholder message sent before the first token
    pub placeholder: String,
    /// Attempt budget for each rate-limited edit
    pub max_attempts: u32,
}

impl Default for RelayOptions {
    fn default() -> Self {
        Self {
            edit_interval: DEFAULT_EDIT_INTERVAL,
            placeholder: "...".to_string(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

// ============================================================================
// Bot Settings
// ============================================================================

/// Settings shared by every handler, read-only after startup
#[derive(Debug, Clone)]
pub struct BotSettings {
    /// Completion request parameters
    pub completion: CompletionOptions,
    /// Stream relay tuning
    pub relay: RelayOptions,
    /// Support contact advertised by `/help`
    pub support_contact: String,
    /// Target language for voice transcription
    pub transcription_language: String,
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            completion: CompletionOptions::default(),
            relay: RelayOptions::default(),
            support_contact: "@useVityaEffect".to_string(),
            transcription_language: "ru".to_string(),
        }
    }
}

impl BotSettings {
    /// Create a new builder for `BotSettings`
    #[must_use]
    pub fn builder() -> BotSettingsBuilder {
        BotSettingsBuilder::default()
    }
}

// ============================================================================
// Builder for BotSettings
// ============================================================================

/// Builder for `BotSettings`
#[derive(Debug, Default)]
pub struct BotSettingsBuilder {
    settings: BotSettings,
}

impl BotSettingsBuilder {
    /// Set the model identifier
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.settings.completion.model = model.into();
        self
    }

    /// Set the sampling temperature
    #[must_use]
    pub const fn temperature(mut self, temperature: f32) -> Self {
        self.settings.completion.temperature = temperature;
        self
    }

    /// Set the maximum generated tokens
    #[must_use]
    pub const fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.settings.completion.max_tokens = max_tokens;
        self
    }

    /// Set the throttle interval between streamed edits
    #[must_use]
    pub const fn edit_interval(mut self, interval: Duration) -> Self {
        self.settings.relay.edit_interval = interval;
        self
    }

    /// Set the attempt budget for rate-limited calls
    ///
    /// # Panics
    /// Panics if attempts is zero
    #[must_use]
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        assert!(attempts > 0, "max_attempts must be at least 1");
        self.settings.relay.max_attempts = attempts;
        self
    }

    /// Set the support contact
    #[must_use]
    pub fn support_contact(mut self, contact: impl Into<String>) -> Self {
        self.settings.support_contact = contact.into();
        self
    }

    /// Set the transcription language
    #[must_use]
    pub fn transcription_language(mut self, language: impl Into<String>) -> Self {
        self.settings.transcription_language = language.into();
        self
    }

    /// Build the settings
    #[must_use]
    pub fn build(self) -> BotSettings {
        self.settings
    }
}

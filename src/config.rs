//! Process configuration
//!
//! Loaded once at startup from environment variables via the `config`
//! crate and read-only afterwards. Optional keys fall back to serde
//! defaults; empty variables count as unset.

use serde::Deserialize;
use std::fmt;

use crate::completion::openai::DEFAULT_BASE_URL;
use crate::error::{RelayError, Result};
use crate::platform::telegram::DEFAULT_API_URL;
use crate::types::identifiers::ChannelRef;
use crate::types::options::BotSettings;

/// `ENV_MODE` value that bypasses the membership gate
pub const DEVELOPMENT_MODE: &str = "development";

/// Settings read from the environment
#[derive(Clone, Deserialize)]
pub struct Config {
    /// Messaging platform bot token (`BOT_TOKEN`)
    #[serde(default)]
    pub bot_token: String,

    /// Completion service API key (`OPENAI_API_KEY`)
    #[serde(default)]
    pub openai_api_key: String,

    /// Channel users must belong to, numeric ID or `@username` (`CHANNEL_ID`)
    #[serde(default)]
    pub channel_id: Option<String>,

    /// Support contact shown by `/help` (`SUPPORT_BOT`)
    #[serde(default = "default_support_bot")]
    pub support_bot: String,

    /// Model identifier (`GPT_MODEL`)
    #[serde(default = "default_gpt_model")]
    pub gpt_model: String,

    /// Deployment mode (`ENV_MODE`)
    #[serde(default = "default_env_mode")]
    pub env_mode: String,

    /// Whether channel membership is enforced (`REQUIRE_SUBSCRIPTION`)
    #[serde(default)]
    pub require_subscription: bool,

    /// Voice transcription language (`TRANSCRIPTION_LANGUAGE`)
    #[serde(default = "default_transcription_language")]
    pub transcription_language: String,

    /// Sampling temperature (`TEMPERATURE`)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum generated tokens (`MAX_TOKENS`)
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Completion service base URL (`OPENAI_BASE_URL`)
    #[serde(default = "default_openai_base_url")]
    pub openai_base_url: String,

    /// Messaging platform API URL (`TELEGRAM_API_URL`)
    #[serde(default = "default_telegram_api_url")]
    pub telegram_api_url: String,

    /// Bound on concurrently running handlers (`MAX_CONCURRENT_HANDLERS`)
    #[serde(default)]
    pub max_concurrent_handlers: Option<usize>,
}

fn default_support_bot() -> String {
    "@useVityaEffect".to_string()
}

fn default_gpt_model() -> String {
    "gpt-4o".to_string()
}

fn default_env_mode() -> String {
    "production".to_string()
}

fn default_transcription_language() -> String {
    "ru".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    2000
}

fn default_openai_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_telegram_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bot_token", &"<redacted>")
            .field("openai_api_key", &"<redacted>")
            .field("channel_id", &self.channel_id)
            .field("support_bot", &self.support_bot)
            .field("gpt_model", &self.gpt_model)
            .field("env_mode", &self.env_mode)
            .field("require_subscription", &self.require_subscription)
            .field("transcription_language", &self.transcription_language)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("openai_base_url", &self.openai_base_url)
            .field("telegram_api_url", &self.telegram_api_url)
            .field("max_concurrent_handlers", &self.max_concurrent_handlers)
            .finish()
    }
}

impl Config {
    /// Load configuration from the process environment
    ///
    /// # Errors
    /// Returns `InvalidConfig` if a value cannot be parsed or a required
    /// credential is missing
    pub fn from_env() -> Result<Self> {
        Self::load(config::Environment::default())
    }

    /// Load configuration from an explicit set of variables
    ///
    /// Behaves like [`Config::from_env`] but never reads the process
    /// environment.
    ///
    /// # Errors
    /// Returns `InvalidConfig` if a value cannot be parsed or a required
    /// credential is missing
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: config::Map<String, String> = vars
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        Self::load(config::Environment::default().source(Some(vars)))
    }

    fn load(environment: config::Environment) -> Result<Self> {
        let config: Self = config::Config::builder()
            .add_source(environment.separator("__").ignore_empty(true))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.bot_token.trim().is_empty() || self.openai_api_key.trim().is_empty() {
            return Err(RelayError::invalid_config(
                "BOT_TOKEN and OPENAI_API_KEY are required",
            ));
        }
        if self.max_concurrent_handlers == Some(0) {
            return Err(RelayError::invalid_config(
                "MAX_CONCURRENT_HANDLERS must be at least 1",
            ));
        }
        Ok(())
    }

    /// Whether the process runs in development mode
    #[must_use]
    pub fn is_development(&self) -> bool {
        self.env_mode.eq_ignore_ascii_case(DEVELOPMENT_MODE)
    }

    /// Configured channel, if any
    #[must_use]
    pub fn channel(&self) -> Option<ChannelRef> {
        self.channel_id
            .as_deref()
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .map(ChannelRef::parse)
    }

    /// Channel whose membership must be enforced, if enforcement is on
    ///
    /// Enforcement needs `REQUIRE_SUBSCRIPTION`, a configured channel, and
    /// a non-development mode.
    #[must_use]
    pub fn enforced_channel(&self) -> Option<ChannelRef> {
        if !self.require_subscription || self.is_development() {
            return None;
        }
        self.channel()
    }

    /// Handler settings derived from this configuration
    #[must_use]
    pub fn bot_settings(&self) -> BotSettings {
        BotSettings::builder()
            .model(self.gpt_model.clone())
            .temperature(self.temperature)
            .max_tokens(self.max_tokens)
            .support_contact(self.support_bot.clone())
            .transcription_language(self.transcription_language.clone())
            .build()
    }
}

//! Tests for environment configuration loading

use chat_relay::{ChannelRef, Config, RelayError};

const CREDENTIALS: [(&str, &str); 2] = [("BOT_TOKEN", "123:abc"), ("OPENAI_API_KEY", "sk-test")];

#[test]
fn test_defaults_applied() {
    let config = Config::from_vars(CREDENTIALS).unwrap();

    assert_eq!(config.bot_token, "123:abc");
    assert_eq!(config.support_bot, "@useVityaEffect");
    assert_eq!(config.gpt_model, "gpt-4o");
    assert_eq!(config.env_mode, "production");
    assert_eq!(config.transcription_language, "ru");
    assert_eq!(config.max_tokens, 2000);
    assert!((config.temperature - 0.7).abs() < f32::EPSILON);
    assert!(!config.require_subscription);
    assert!(config.channel().is_none());
    assert!(config.max_concurrent_handlers.is_none());
    assert!(!config.is_development());
}

#[test]
fn test_missing_credentials_rejected() {
    let err = Config::from_vars([("BOT_TOKEN", "123:abc")]).unwrap_err();
    assert!(matches!(
        err,
        RelayError::InvalidConfig(ref m) if m == "BOT_TOKEN and OPENAI_API_KEY are required"
    ));

    let err = Config::from_vars([("BOT_TOKEN", ""), ("OPENAI_API_KEY", "sk")]).unwrap_err();
    assert!(matches!(err, RelayError::InvalidConfig(_)));
}

#[test]
fn test_overrides_parsed() {
    let mut vars: Vec<(&str, &str)> = CREDENTIALS.to_vec();
    vars.extend([
        ("GPT_MODEL", "gpt-4o-mini"),
        ("TEMPERATURE", "0.2"),
        ("MAX_TOKENS", "512"),
        ("MAX_CONCURRENT_HANDLERS", "8"),
        ("CHANNEL_ID", "-1001234"),
        ("SUPPORT_BOT", "@helpdesk"),
    ]);
    let config = Config::from_vars(vars).unwrap();

    assert_eq!(config.max_tokens, 512);
    assert_eq!(config.max_concurrent_handlers, Some(8));
    assert_eq!(config.channel(), Some(ChannelRef::Id(-1_001_234)));

    let settings = config.bot_settings();
    assert_eq!(settings.completion.model, "gpt-4o-mini");
    assert_eq!(settings.completion.max_tokens, 512);
    assert_eq!(settings.support_contact, "@helpdesk");
}

#[test]
fn test_membership_enforcement_rules() {
    let mut vars: Vec<(&str, &str)> = CREDENTIALS.to_vec();
    vars.push(("CHANNEL_ID", "@news"));
    let config = Config::from_vars(vars.clone()).unwrap();
    assert!(config.enforced_channel().is_none());

    vars.push(("REQUIRE_SUBSCRIPTION", "true"));
    let config = Config::from_vars(vars.clone()).unwrap();
    assert_eq!(
        config.enforced_channel(),
        Some(ChannelRef::Username("@news".to_string()))
    );

    vars.push(("ENV_MODE", "development"));
    let config = Config::from_vars(vars).unwrap();
    assert!(config.is_development());
    assert!(config.enforced_channel().is_none());
}

#[test]
fn test_debug_redacts_secrets() {
    let config = Config::from_vars(CREDENTIALS).unwrap();
    let rendered = format!("{config:?}");
    assert!(!rendered.contains("123:abc"));
    assert!(!rendered.contains("sk-test"));
}

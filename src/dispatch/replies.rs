//! User-facing reply texts

/// Reply to `/new`
pub const NEW_DIALOG: &str = "🆕 Starting new dialog ✅";

/// Reply when a voice attachment cannot be downloaded or transcribed
pub const VOICE_FAILED: &str = "Sorry, I couldn't process your voice message.";

/// Reply when the completion stream cannot be opened
pub const COMPLETION_FAILED: &str = "Sorry, an error occurred. Please try again later.";

/// Reply to `/start`
#[must_use]
pub fn welcome(model: &str) -> String {
    format!(
        "Hi! I'm a ChatGPT bot 🤖\n🎤 You can send Voice Messages instead of text\n🦄 Current model: {model}"
    )
}

/// Reply to `/help`
#[must_use]
pub fn help(support_contact: &str) -> String {
    format!(
        "🔧 *Need help or found a bug?*\n\nIf something isn't working properly or you have questions, feel free to contact our support: {support_contact}\n\nWe'll be happy to help! 🤝"
    )
}

/// Notice sent by the membership gate to users outside the channel
#[must_use]
pub fn subscribe_notice(channel: &str) -> String {
    format!("Please subscribe to our channel {channel} to use the bot in full functionality.")
}

// Chat relay bot
//
// Long-polls the messaging platform, answers through the completion
// service, and exits cleanly on Ctrl+C or SIGTERM.

use anyhow::{Context, Result};
use chat_relay::dispatch::replies;
use chat_relay::{AuthorizationGate, Config, Dispatcher, OpenAiClient, TelegramClient};
use std::sync::Arc;
use tokio::signal;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env().context("Failed to load config")?;
    log::debug!("Loaded {config:?}");

    let platform = Arc::new(
        TelegramClient::new(&config.bot_token, &config.telegram_api_url)
            .context("Failed to create bot")?,
    );
    let completion = Arc::new(
        OpenAiClient::new(&config.openai_api_key, &config.openai_base_url)
            .context("Failed to create completion client")?,
    );

    let gate = match config.enforced_channel() {
        Some(channel) => {
            log::info!("Requiring membership in channel {channel}");
            let notice = replies::subscribe_notice(&channel.to_string());
            AuthorizationGate::channel_membership(Arc::clone(&platform), channel, notice)
        }
        None => AuthorizationGate::allow_all(),
    };

    let dispatcher = Dispatcher::builder(platform, completion)
        .settings(config.bot_settings())
        .gate(gate)
        .max_concurrent(config.max_concurrent_handlers)
        .build();

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        signal_cancel.cancel();
    });

    log::info!("Starting bot...");
    dispatcher.run(cancel).await?;
    log::info!("Shutting down bot...");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            log::warn!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                log::warn!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => log::info!("Received Ctrl+C, shutting down..."),
        () = terminate => log::info!("Received SIGTERM, shutting down..."),
    }
}

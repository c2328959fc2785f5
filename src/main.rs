use std::sync::Arc;

use dotenvy::dotenv;
use telegram_file_relay::config::BotConfig;
use telegram_file_relay::{AppState, bot};
use teloxide::Bot;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "telegram_file_relay=info,teloxide=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = BotConfig::from_env()?;
    info!(
        backend = %config.backend_url,
        timeout_secs = config.upload_timeout.as_secs(),
        "🚀 Starting Telegram file relay..."
    );

    let telegram_bot = Bot::new(config.telegram_token.clone());
    let state = Arc::new(AppState::new(config)?);

    bot::run(telegram_bot, state).await;

    info!("👋 Relay exited cleanly.");
    Ok(())
}

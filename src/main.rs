use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use reddit_relay::channels::TelegramChannel;
use reddit_relay::config::RelayConfig;
use reddit_relay::logging;
use reddit_relay::relay::{Relay, spawn_signal_listener};
use reddit_relay::source::RedditSource;
use reddit_relay::store::LibSqlWatermarkStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; the real environment may carry everything.
    let dotenv = dotenvy::dotenv();

    let config = RelayConfig::from_env().context("Invalid configuration")?;

    let _log_guard = logging::init(config.log_dir.as_deref());

    match dotenv {
        Ok(path) => info!(path = %path.display(), "Loaded .env"),
        Err(e) if e.not_found() => {}
        Err(e) => warn!(error = %e, "Failed to load .env"),
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        subreddit = %config.pipeline.source_name,
        chat_id = config.pipeline.chat_id,
        store = %config.store_path.display(),
        "Starting reddit-relay"
    );

    // ── Store ───────────────────────────────────────────────────────────
    let store = LibSqlWatermarkStore::new_local(&config.store_path)
        .await
        .with_context(|| format!("Failed to open store at {}", config.store_path.display()))?;

    // ── Clients ─────────────────────────────────────────────────────────
    let source =
        RedditSource::new(&config.user_agent).context("Failed to build Reddit client")?;

    let telegram = TelegramChannel::new(config.bot_token.clone());
    telegram
        .health_check()
        .await
        .context("Telegram bot token check failed")?;

    // ── Run ─────────────────────────────────────────────────────────────
    let cancel = CancellationToken::new();
    let _signals = spawn_signal_listener(cancel.clone());

    let relay = Relay::new(
        config.pipeline.clone(),
        Arc::new(source),
        Arc::new(store),
        Arc::new(telegram),
    );
    let stats = relay.run(cancel).await?;

    info!(sent = stats.sent, failed = stats.failed, "Shutdown complete");
    Ok(())
}

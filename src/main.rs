//! trade-runner entry point
//!
//! Boot sequence:
//! 1. Load settings from the environment
//! 2. Start the bot (exit non-zero if initialization fails)
//! 3. Wait for an interrupt, then run the full stop path before exiting

use tracing::{error, info};

use trade_runner::{Bot, Settings, StartOutcome};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    info!("Starting trade-runner...");

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            error!("Invalid configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    info!(
        "Network: {} | Interval: {}m | Trading enabled: {} | Watchlist: {} token(s)",
        settings.network,
        settings.analysis_interval.as_secs() / 60,
        settings.trading_enabled,
        settings.watchlist.len()
    );

    let bot = Bot::new(settings);

    match bot.start().await {
        Ok(StartOutcome::Started { mode }) => {
            info!("Bot started in {} mode, press Ctrl+C to stop", mode);
        }
        Ok(StartOutcome::AlreadyRunning) => {
            // Single caller at boot; nothing to do
        }
        Err(e) => {
            error!("Failed to start: {}", e);
            std::process::exit(1);
        }
    }

    tokio::signal::ctrl_c().await?;
    info!("Interrupt received, shutting down...");

    // The process must not exit before the stop path completes
    let summary = bot.stop().await;
    info!("{}", summary.message);

    Ok(())
}

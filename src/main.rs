mod bot;

use anyhow::Result;
use tracing_subscriber::{fmt, EnvFilter};

use pattern_trading_bot::config::Config;
use pattern_trading_bot::exchange::OkxClient;
use pattern_trading_bot::stats::JsonStatsStore;

use crate::bot::PatternBot;

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::from_env()?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cfg.log_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .init();

    let market = Box::new(OkxClient::new(&cfg));
    let stats_repo = Box::new(JsonStatsStore::new(&cfg.data_dir));
    let shared_config = cfg.shared();

    let mut bot = PatternBot::new(shared_config, market, stats_repo).await?;
    bot.run().await?;

    Ok(())
}

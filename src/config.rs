use anyhow::{Context, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::models::{DayOfWeek, PatternLabel, RiskLevel};

pub type SharedConfig = Arc<RwLock<Config>>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Exchange
    pub exchange: String,
    pub symbol: String,
    pub okx_api_key: String,
    pub okx_api_secret: String,
    pub okx_passphrase: String,
    /// Routes orders to the OKX demo environment.
    pub simulated_trading: bool,

    // Strategy
    pub risk_level: RiskLevel,
    /// (day the pattern was observed, pattern) pairs that never trade.
    pub deny_list: Vec<(DayOfWeek, PatternLabel)>,
    /// Hours of hourly closes fed to pattern analysis.
    pub price_history_hours: usize,
    /// Zone the trading day is derived in.
    pub timezone: Tz,

    // Funds
    /// Used when the balance fetch fails at startup.
    pub default_balance: f64,

    // Loop cadence
    pub poll_interval_secs: u64,
    pub error_backoff_secs: u64,
    pub stats_refresh_secs: u64,

    // Storage & logging
    pub data_dir: String,
    pub log_level: String,
}

impl Config {
    /// Build from environment (a `.env` file is honored). Unknown risk
    /// levels, timezones, or deny-list entries fail here rather than
    /// being silently defaulted.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let env = |key: &str, default: &str| -> String {
            std::env::var(key).unwrap_or_else(|_| default.to_string())
        };

        let risk_level = RiskLevel::from_str(&env("RISK_LEVEL", "low"))
            .context("RISK_LEVEL is not a valid risk level")?;

        let timezone: Tz = env("TRADING_TIMEZONE", "Asia/Hong_Kong")
            .parse()
            .map_err(|e| anyhow::anyhow!("TRADING_TIMEZONE is invalid: {e}"))?;

        let deny_list = match std::env::var("DENY_LIST") {
            Ok(raw) => parse_deny_list(&raw)?,
            Err(_) => default_deny_list(),
        };

        Ok(Config {
            exchange: "okx".to_string(),
            symbol: env("TRADING_SYMBOL", "BTC-USDT"),
            okx_api_key: env("OKX_API_KEY", ""),
            okx_api_secret: env("OKX_SECRET_KEY", ""),
            okx_passphrase: env("OKX_PASSPHRASE", ""),
            simulated_trading: env("SIMULATED_TRADING", "true").to_lowercase() == "true",
            risk_level,
            deny_list,
            price_history_hours: env("PRICE_HISTORY_HOURS", "4").parse().unwrap_or(4),
            timezone,
            default_balance: env("DEFAULT_BALANCE", "1000").parse().unwrap_or(1000.0),
            poll_interval_secs: env("POLL_INTERVAL", "10").parse().unwrap_or(10),
            error_backoff_secs: env("ERROR_BACKOFF", "60").parse().unwrap_or(60),
            stats_refresh_secs: env("STATS_REFRESH", "28800").parse().unwrap_or(28800),
            data_dir: env("DATA_DIR", "data"),
            log_level: env("LOG_LEVEL", "INFO"),
        })
    }

    pub fn shared(self) -> SharedConfig {
        Arc::new(RwLock::new(self))
    }
}

pub fn default_deny_list() -> Vec<(DayOfWeek, PatternLabel)> {
    vec![
        (DayOfWeek::Friday, PatternLabel::ContinuousRise),
        (DayOfWeek::Saturday, PatternLabel::FallThenRise),
    ]
}

/// Parse `Friday:continuous_rise,Saturday:fall_then_rise` style entries.
fn parse_deny_list(raw: &str) -> Result<Vec<(DayOfWeek, PatternLabel)>> {
    raw.split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|pair| {
            let (day, pattern) = pair
                .trim()
                .split_once(':')
                .context("deny-list entries are day:pattern")?;
            Ok((
                DayOfWeek::from_str(day.trim())?,
                PatternLabel::from_str(pattern.trim())?,
            ))
        })
        .collect()
}

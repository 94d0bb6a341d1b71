use crate::config::{default_deny_list, Config};
use crate::models::{DayOfWeek, PatternLabel, RiskLevel};
use crate::stats::{PatternStatEntry, PatternStats, VolatilityMap};

/// Stats table mirroring the bootstrap model data, as fractions.
pub fn sample_pattern_stats() -> PatternStats {
    let entry = |win_rate: f64, return_rate: f64| PatternStatEntry {
        win_rate,
        return_rate,
        volatility: None,
        sample_size: Some(100),
    };

    let mut stats = PatternStats::new();
    stats.insert(
        DayOfWeek::Sunday,
        PatternLabel::RiseThenFall,
        entry(0.6125, 0.0064),
    );
    stats.insert(
        DayOfWeek::Sunday,
        PatternLabel::ContinuousFall,
        entry(0.6036, 0.0097),
    );
    stats.insert(
        DayOfWeek::Sunday,
        PatternLabel::FallThenRise,
        entry(0.4338, -0.0050),
    );
    stats.insert(
        DayOfWeek::Sunday,
        PatternLabel::ContinuousRise,
        entry(0.65, 0.008),
    );
    stats.insert(
        DayOfWeek::Friday,
        PatternLabel::ContinuousRise,
        entry(0.5669, 0.0083),
    );
    stats.insert(
        DayOfWeek::Friday,
        PatternLabel::RiseThenFall,
        entry(0.5868, 0.0030),
    );
    stats.insert(
        DayOfWeek::Saturday,
        PatternLabel::ContinuousRise,
        entry(0.4424, -0.0060),
    );
    stats
}

pub fn sample_volatility() -> VolatilityMap {
    let mut map = VolatilityMap::new();
    map.insert(DayOfWeek::Monday, 0.0299);
    map.insert(DayOfWeek::Wednesday, 0.0295);
    map.insert(DayOfWeek::Saturday, 0.0152);
    map
}

/// A Config suitable for testing: simulated mode, no credentials, temp
/// data dir.
pub fn default_test_config() -> Config {
    Config {
        exchange: "okx".to_string(),
        symbol: "BTC-USDT".to_string(),
        okx_api_key: String::new(),
        okx_api_secret: String::new(),
        okx_passphrase: String::new(),
        simulated_trading: true,
        risk_level: RiskLevel::Medium,
        deny_list: default_deny_list(),
        price_history_hours: 4,
        timezone: chrono_tz::Asia::Hong_Kong,
        default_balance: 1000.0,
        poll_interval_secs: 10,
        error_backoff_secs: 60,
        stats_refresh_secs: 28800,
        data_dir: std::env::temp_dir()
            .join("pattern_bot_test")
            .to_string_lossy()
            .to_string(),
        log_level: "ERROR".to_string(),
    }
}

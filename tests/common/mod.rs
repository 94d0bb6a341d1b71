use pattern_trading_bot::models::{DayOfWeek, PatternLabel};
use pattern_trading_bot::stats::{PatternStatEntry, PatternStats, VolatilityMap};

/// Stats table with the bootstrap model values, as fractions.
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
        PatternLabel::ContinuousRise,
        entry(0.65, 0.008),
    );
    stats.insert(
        DayOfWeek::Sunday,
        PatternLabel::RiseThenFall,
        entry(0.6125, 0.0064),
    );
    stats.insert(
        DayOfWeek::Friday,
        PatternLabel::ContinuousRise,
        entry(0.5669, 0.0083),
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

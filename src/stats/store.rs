use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::models::{DayOfWeek, PatternLabel, TradeResult};
use crate::stats::{PatternStatEntry, PatternStats, StatsRepository, VolatilityMap};

/// Rows with fewer observations than this are not trusted for sizing and
/// are dropped at load.
const MIN_CASES: u32 = 20;

/// One row of the pattern table as persisted. Rates are stored in percent,
/// matching the upstream model export; loading converts to fractions.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PatternRow {
    week_period: DayOfWeek,
    pattern: PatternLabel,
    cases: u32,
    next_day_win_rate: f64,
    avg_next_return: f64,
    avg_movement: f64,
}

/// File-backed stats repository. The pattern table is read-only from this
/// crate's point of view (refreshed out-of-band by the model pipeline);
/// closed trades append to a separate history file.
pub struct JsonStatsStore {
    stats_file: String,
    trades_file: String,
}

impl JsonStatsStore {
    pub fn new(data_dir: &str) -> Self {
        Self {
            stats_file: format!("{}/pattern_stats.json", data_dir),
            trades_file: format!("{}/trade_history.json", data_dir),
        }
    }

    fn load_rows(&self) -> Result<Vec<PatternRow>> {
        match fs::read_to_string(&self.stats_file) {
            Ok(content) => {
                serde_json::from_str(&content).context("failed to parse pattern stats file")
            }
            Err(_) => {
                info!(
                    "No pattern stats at {}, seeding bootstrap table",
                    self.stats_file
                );
                let rows = bootstrap_rows();
                self.save_rows(&rows);
                Ok(rows)
            }
        }
    }

    fn save_rows(&self, rows: &[PatternRow]) {
        if let Some(parent) = Path::new(&self.stats_file).parent() {
            let _ = fs::create_dir_all(parent);
        }
        if let Ok(json) = serde_json::to_string_pretty(rows) {
            let _ = fs::write(&self.stats_file, json);
        }
    }
}

#[async_trait]
impl StatsRepository for JsonStatsStore {
    async fn get_pattern_stats(&self) -> Result<PatternStats> {
        let rows = self.load_rows()?;
        let mut stats = PatternStats::new();

        for row in &rows {
            if row.cases < MIN_CASES {
                debug!(
                    "Skipping {} / {}: only {} cases",
                    row.week_period, row.pattern, row.cases
                );
                continue;
            }
            let win_rate = (row.next_day_win_rate / 100.0).clamp(0.0, 1.0);
            stats.insert(
                row.week_period,
                row.pattern,
                PatternStatEntry {
                    win_rate,
                    return_rate: row.avg_next_return / 100.0,
                    volatility: Some(row.avg_movement / 100.0),
                    sample_size: Some(row.cases),
                },
            );
        }

        if stats.is_empty() {
            warn!("Pattern stats table is empty after filtering");
        }
        Ok(stats)
    }

    async fn get_volatility(&self) -> Result<VolatilityMap> {
        let rows = self.load_rows()?;
        let mut map = VolatilityMap::new();
        for row in &rows {
            map.insert(row.week_period, row.avg_movement / 100.0);
        }
        Ok(map)
    }

    async fn record_trade(&self, result: &TradeResult) -> Result<()> {
        let mut history: Vec<TradeResult> = match fs::read_to_string(&self.trades_file) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_default(),
            Err(_) => Vec::new(),
        };
        history.push(result.clone());

        if let Some(parent) = Path::new(&self.trades_file).parent() {
            fs::create_dir_all(parent).context("failed to create data dir")?;
        }
        let json =
            serde_json::to_string_pretty(&history).context("failed to serialize trade history")?;
        fs::write(&self.trades_file, json).context("failed to write trade history")?;
        Ok(())
    }

    async fn get_trade_history(&self) -> Result<Vec<TradeResult>> {
        match fs::read_to_string(&self.trades_file) {
            Ok(content) => {
                serde_json::from_str(&content).context("failed to parse trade history file")
            }
            Err(_) => Ok(Vec::new()),
        }
    }
}

/// Initial model table shipped with the bot, used until the pipeline
/// produces a fresh export.
fn bootstrap_rows() -> Vec<PatternRow> {
    let row = |week_period, pattern, next_day_win_rate, avg_next_return, avg_movement| PatternRow {
        week_period,
        pattern,
        cases: 100,
        next_day_win_rate,
        avg_next_return,
        avg_movement,
    };

    vec![
        row(
            DayOfWeek::Sunday,
            PatternLabel::RiseThenFall,
            61.25,
            0.64,
            2.00,
        ),
        row(
            DayOfWeek::Sunday,
            PatternLabel::ContinuousFall,
            60.36,
            0.97,
            2.00,
        ),
        row(
            DayOfWeek::Sunday,
            PatternLabel::FallThenRise,
            43.38,
            -0.50,
            2.00,
        ),
        row(
            DayOfWeek::Friday,
            PatternLabel::ContinuousRise,
            56.69,
            0.83,
            2.00,
        ),
        row(
            DayOfWeek::Friday,
            PatternLabel::RiseThenFall,
            58.68,
            0.30,
            2.00,
        ),
        row(
            DayOfWeek::Saturday,
            PatternLabel::ContinuousRise,
            44.24,
            -0.60,
            1.52,
        ),
        row(
            DayOfWeek::Monday,
            PatternLabel::ContinuousRise,
            50.00,
            0.10,
            2.99,
        ),
        row(
            DayOfWeek::Wednesday,
            PatternLabel::ContinuousRise,
            50.00,
            0.10,
            2.95,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ExitReason;
    use chrono::Utc;

    fn temp_store(tag: &str) -> JsonStatsStore {
        let dir = std::env::temp_dir()
            .join(format!("pattern_bot_store_{}_{}", tag, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        JsonStatsStore::new(&dir.to_string_lossy())
    }

    #[tokio::test]
    async fn seeds_bootstrap_table_when_missing() {
        let store = temp_store("seed");
        let stats = store.get_pattern_stats().await.unwrap();
        assert!(!stats.is_empty());

        // The seeded cell converts percent to fraction.
        let entry = stats
            .get(DayOfWeek::Friday, PatternLabel::ContinuousRise)
            .unwrap();
        assert!((entry.win_rate - 0.5669).abs() < 1e-9);
        assert!((entry.return_rate - 0.0083).abs() < 1e-9);
    }

    #[tokio::test]
    async fn filters_thin_rows() {
        let store = temp_store("filter");
        let mut rows = bootstrap_rows();
        rows[0].cases = 5; // Sunday rise_then_fall becomes untrusted
        store.save_rows(&rows);

        let stats = store.get_pattern_stats().await.unwrap();
        assert!(stats
            .get(DayOfWeek::Sunday, PatternLabel::RiseThenFall)
            .is_none());
        assert!(stats
            .get(DayOfWeek::Sunday, PatternLabel::ContinuousFall)
            .is_some());
    }

    #[tokio::test]
    async fn volatility_map_from_rows() {
        let store = temp_store("vol");
        let vol = store.get_volatility().await.unwrap();
        assert!((vol[&DayOfWeek::Monday] - 0.0299).abs() < 1e-9);
        assert!((vol[&DayOfWeek::Saturday] - 0.0152).abs() < 1e-9);
    }

    #[tokio::test]
    async fn record_trade_appends() {
        let store = temp_store("trades");
        let result = TradeResult {
            entry_price: 100.0,
            exit_price: 103.0,
            profit_pct: 0.03,
            profit_amount: 15.0,
            entry_time: Utc::now(),
            exit_time: Utc::now(),
            pattern: PatternLabel::ContinuousRise,
            day: DayOfWeek::Monday,
            exit_reason: ExitReason::TakeProfit,
        };
        store.record_trade(&result).await.unwrap();
        store.record_trade(&result).await.unwrap();

        let history = store.get_trade_history().await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].exit_reason, ExitReason::TakeProfit);
    }
}

pub mod store;

pub use store::JsonStatsStore;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::{DayOfWeek, PatternLabel, TradeResult};

/// Historical edge for one (day, pattern) cell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternStatEntry {
    /// Probability of a favorable next-day move, in `[0, 1]`.
    pub win_rate: f64,
    /// Signed fractional next-day return.
    pub return_rate: f64,
    pub volatility: Option<f64>,
    pub sample_size: Option<u32>,
}

/// Expected daily volatility fraction per day of week.
pub type VolatilityMap = HashMap<DayOfWeek, f64>;

/// The full (day, pattern) → stats table, with the previous-day lookup
/// rule in one place.
#[derive(Debug, Clone, Default)]
pub struct PatternStats {
    entries: HashMap<(DayOfWeek, PatternLabel), PatternStatEntry>,
}

impl PatternStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, day: DayOfWeek, pattern: PatternLabel, entry: PatternStatEntry) {
        self.entries.insert((day, pattern), entry);
    }

    /// Direct cell access, keyed on the day the pattern was observed.
    pub fn get(&self, day: DayOfWeek, pattern: PatternLabel) -> Option<&PatternStatEntry> {
        self.entries.get(&(day, pattern))
    }

    /// Stats relevant to a trade taken on `trading_day`: the win rates
    /// answer "given yesterday's pattern, how does today move", so this
    /// reads the cell for the previous calendar day. `None` means no
    /// edge is known; callers must treat that as "do not trade", never
    /// as a zero win rate.
    pub fn for_trading_day(
        &self,
        trading_day: DayOfWeek,
        pattern: PatternLabel,
    ) -> Option<&PatternStatEntry> {
        self.get(trading_day.previous(), pattern)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn days_covered(&self) -> Vec<DayOfWeek> {
        let mut days: Vec<DayOfWeek> = self.entries.keys().map(|(d, _)| *d).collect();
        days.sort_by_key(|d| d.as_str());
        days.dedup();
        days
    }
}

/// Read access to the precomputed model data plus trade recording.
/// Refresh cadence and the computation that produces the tables live
/// outside this crate.
#[async_trait]
pub trait StatsRepository: Send + Sync {
    async fn get_pattern_stats(&self) -> Result<PatternStats>;
    async fn get_volatility(&self) -> Result<VolatilityMap>;
    async fn record_trade(&self, result: &TradeResult) -> Result<()>;
    async fn get_trade_history(&self) -> Result<Vec<TradeResult>>;
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{DayOfWeek, Direction, ExitReason, PatternLabel};

/// One open trade. At most one exists per trading pair; the stop_loss is
/// the only field mutated after open (by the trailing ratchet).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub direction: Direction,
    pub entry_price: f64,
    /// Quote-currency notional committed at entry. The unit convention is
    /// the caller's; profit_amount on close is price-move times this value.
    pub size: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub entry_time: DateTime<Utc>,
    pub pattern: PatternLabel,
    pub day: DayOfWeek,
}

impl Position {
    /// Signed fractional move from entry to `current_price`, positive when
    /// the position is in profit.
    pub fn profit_pct(&self, current_price: f64) -> f64 {
        (current_price - self.entry_price) / self.entry_price * self.direction.sign()
    }
}

/// Immutable record of a completed trade, handed to the stats repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeResult {
    pub entry_price: f64,
    pub exit_price: f64,
    pub profit_pct: f64,
    pub profit_amount: f64,
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
    pub pattern: PatternLabel,
    pub day: DayOfWeek,
    pub exit_reason: ExitReason,
}

use serde::{Deserialize, Serialize};

use crate::models::TradeResult;

/// Aggregate view over closed trades, for status logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeSummary {
    pub total_trades: usize,
    pub win_rate: f64,
    pub total_pnl: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub best_trade: f64,
    pub worst_trade: f64,
}

pub fn summarize(history: &[TradeResult]) -> TradeSummary {
    if history.is_empty() {
        return TradeSummary {
            total_trades: 0,
            win_rate: 0.0,
            total_pnl: 0.0,
            avg_win: 0.0,
            avg_loss: 0.0,
            best_trade: 0.0,
            worst_trade: 0.0,
        };
    }

    let wins: Vec<&TradeResult> = history.iter().filter(|t| t.profit_amount > 0.0).collect();
    let losses: Vec<&TradeResult> = history.iter().filter(|t| t.profit_amount <= 0.0).collect();

    let avg = |trades: &[&TradeResult]| {
        if trades.is_empty() {
            0.0
        } else {
            trades.iter().map(|t| t.profit_amount).sum::<f64>() / trades.len() as f64
        }
    };

    TradeSummary {
        total_trades: history.len(),
        win_rate: round1(wins.len() as f64 / history.len() as f64 * 100.0),
        total_pnl: round2(history.iter().map(|t| t.profit_amount).sum()),
        avg_win: round2(avg(&wins)),
        avg_loss: round2(avg(&losses)),
        best_trade: round2(
            history
                .iter()
                .map(|t| t.profit_amount)
                .fold(f64::NEG_INFINITY, f64::max),
        ),
        worst_trade: round2(
            history
                .iter()
                .map(|t| t.profit_amount)
                .fold(f64::INFINITY, f64::min),
        ),
    }
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DayOfWeek, ExitReason, PatternLabel};
    use chrono::Utc;

    fn trade(profit_amount: f64) -> TradeResult {
        TradeResult {
            entry_price: 100.0,
            exit_price: 100.0 + profit_amount / 5.0,
            profit_pct: profit_amount / 500.0,
            profit_amount,
            entry_time: Utc::now(),
            exit_time: Utc::now(),
            pattern: PatternLabel::ContinuousRise,
            day: DayOfWeek::Monday,
            exit_reason: ExitReason::TakeProfit,
        }
    }

    #[test]
    fn empty_history_summary() {
        let s = summarize(&[]);
        assert_eq!(s.total_trades, 0);
        assert_eq!(s.total_pnl, 0.0);
    }

    #[test]
    fn mixed_history() {
        let history = vec![trade(10.0), trade(-5.0), trade(20.0), trade(-5.0)];
        let s = summarize(&history);
        assert_eq!(s.total_trades, 4);
        assert_eq!(s.win_rate, 50.0);
        assert_eq!(s.total_pnl, 20.0);
        assert_eq!(s.avg_win, 15.0);
        assert_eq!(s.avg_loss, -5.0);
        assert_eq!(s.best_trade, 20.0);
        assert_eq!(s.worst_trade, -5.0);
    }
}

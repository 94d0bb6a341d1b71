use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::models::{Direction, ExitReason, Position, TradeResult};

/// Positions older than this are liquidated regardless of price.
const MAX_HOLD_HOURS: i64 = 24;

/// Break-even protection bands, checked top down; the first band the
/// current profit clears wins. Values are (profit threshold, stop level
/// as a multiple of entry, long convention).
const RATCHET_BANDS: &[(f64, f64)] = &[(0.03, 1.01), (0.02, 1.005), (0.01, 1.0)];

/// Outcome of a trailing-stop update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PositionUpdate {
    NoPosition,
    Updated {
        profit_pct: f64,
        stop_loss: f64,
        /// True when the ratchet actually moved the stop this tick.
        raised: bool,
    },
}

/// Outcome of an exit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitCheck {
    NoPosition,
    Hold,
    Exit(ExitReason),
}

/// Owns the single open position for a trading pair and drives it through
/// trailing-stop updates, exit checks, and close. Calls on an empty
/// manager are no-ops, not errors; a second open is a caller bug.
///
/// The caller must serialize open/update/close against each other; the
/// manager assumes one decision cycle at a time.
pub struct PositionManager {
    position: Option<Position>,
    /// When set, used instead of `Utc::now()` (deterministic tests).
    pub sim_time: Option<DateTime<Utc>>,
}

impl PositionManager {
    pub fn new() -> Self {
        Self {
            position: None,
            sim_time: None,
        }
    }

    fn now(&self) -> DateTime<Utc> {
        self.sim_time.unwrap_or_else(Utc::now)
    }

    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    pub fn has_position(&self) -> bool {
        self.position.is_some()
    }

    /// Install a freshly opened position. Rejects a second open and
    /// malformed fields loudly; both indicate caller bugs.
    pub fn open(&mut self, position: Position) -> Result<&Position, EngineError> {
        if self.position.is_some() {
            return Err(EngineError::PositionAlreadyOpen);
        }
        if position.entry_price <= 0.0 {
            return Err(EngineError::InvalidArgument(format!(
                "entry price must be positive, got {}",
                position.entry_price
            )));
        }
        if position.size <= 0.0 {
            return Err(EngineError::InvalidArgument(format!(
                "position size must be positive, got {}",
                position.size
            )));
        }
        self.position = Some(position);
        Ok(self.position.as_ref().unwrap())
    }

    /// Trailing-stop ratchet. The stop only ever moves in the favorable
    /// direction: up for longs, down for shorts. For any sequence of
    /// updates the long stop is non-decreasing.
    pub fn update(&mut self, current_price: f64) -> PositionUpdate {
        let pos = match self.position.as_mut() {
            Some(p) => p,
            None => return PositionUpdate::NoPosition,
        };

        let profit_pct = pos.profit_pct(current_price);

        let candidate = RATCHET_BANDS
            .iter()
            .find(|(threshold, _)| profit_pct > *threshold)
            .map(|(_, level)| match pos.direction {
                Direction::Long => pos.entry_price * level,
                Direction::Short => pos.entry_price * (2.0 - level),
            })
            .unwrap_or(pos.stop_loss);

        let new_stop = match pos.direction {
            Direction::Long => candidate.max(pos.stop_loss),
            Direction::Short => candidate.min(pos.stop_loss),
        };

        let raised = new_stop != pos.stop_loss;
        pos.stop_loss = new_stop;

        PositionUpdate::Updated {
            profit_pct,
            stop_loss: new_stop,
            raised,
        }
    }

    /// Exit conditions in strict priority: stop first, then target, then
    /// the holding-time limit. A tick satisfying several resolves to the
    /// first match.
    pub fn check_exit(&self, current_price: f64) -> ExitCheck {
        let pos = match self.position.as_ref() {
            Some(p) => p,
            None => return ExitCheck::NoPosition,
        };

        let stop_hit = match pos.direction {
            Direction::Long => current_price <= pos.stop_loss,
            Direction::Short => current_price >= pos.stop_loss,
        };
        if stop_hit {
            return ExitCheck::Exit(ExitReason::StopLoss);
        }

        let target_hit = match pos.direction {
            Direction::Long => current_price >= pos.take_profit,
            Direction::Short => current_price <= pos.take_profit,
        };
        if target_hit {
            return ExitCheck::Exit(ExitReason::TakeProfit);
        }

        if self.now() - pos.entry_time > Duration::hours(MAX_HOLD_HOURS) {
            return ExitCheck::Exit(ExitReason::TimeLimit);
        }

        ExitCheck::Hold
    }

    /// Close out the position at `exit_price`. The position is consumed;
    /// the returned result is immutable. `None` when nothing is open.
    pub fn close(&mut self, exit_price: f64, reason: ExitReason) -> Option<TradeResult> {
        let pos = self.position.take()?;

        let profit = (exit_price - pos.entry_price) * pos.direction.sign();
        let profit_pct = profit / pos.entry_price;

        Some(TradeResult {
            entry_price: pos.entry_price,
            exit_price,
            profit_pct,
            profit_amount: profit * pos.size,
            entry_time: pos.entry_time,
            exit_time: self.now(),
            pattern: pos.pattern,
            day: pos.day,
            exit_reason: reason,
        })
    }
}

impl Default for PositionManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DayOfWeek, PatternLabel};

    fn long_position(entry: f64, stop: f64, target: f64) -> Position {
        Position {
            direction: Direction::Long,
            entry_price: entry,
            size: 500.0,
            stop_loss: stop,
            take_profit: target,
            entry_time: DateTime::parse_from_rfc3339("2024-01-15T00:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
            pattern: PatternLabel::ContinuousRise,
            day: DayOfWeek::Monday,
        }
    }

    fn manager_with(position: Position) -> PositionManager {
        let mut mgr = PositionManager::new();
        mgr.sim_time = Some(
            DateTime::parse_from_rfc3339("2024-01-15T04:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
        );
        mgr.open(position).unwrap();
        mgr
    }

    #[test]
    fn double_open_is_an_error() {
        let mut mgr = manager_with(long_position(100.0, 96.0, 106.0));
        let err = mgr.open(long_position(100.0, 96.0, 106.0)).unwrap_err();
        assert!(matches!(err, EngineError::PositionAlreadyOpen));
    }

    #[test]
    fn open_rejects_bad_fields() {
        let mut mgr = PositionManager::new();
        let mut pos = long_position(100.0, 96.0, 106.0);
        pos.entry_price = 0.0;
        assert!(matches!(
            mgr.open(pos),
            Err(EngineError::InvalidArgument(_))
        ));

        let mut pos = long_position(100.0, 96.0, 106.0);
        pos.size = -1.0;
        assert!(matches!(
            mgr.open(pos),
            Err(EngineError::InvalidArgument(_))
        ));
    }

    #[test]
    fn operations_without_position_are_noops() {
        let mut mgr = PositionManager::new();
        assert!(matches!(mgr.update(100.0), PositionUpdate::NoPosition));
        assert_eq!(mgr.check_exit(100.0), ExitCheck::NoPosition);
        assert!(mgr.close(100.0, ExitReason::StopLoss).is_none());
    }

    #[test]
    fn ratchet_bands_in_priority_order() {
        // +1% band: stop moves to break-even.
        let mut mgr = manager_with(long_position(100.0, 96.0, 200.0));
        mgr.update(101.5);
        assert_eq!(mgr.position().unwrap().stop_loss, 100.0);

        // +2% band: entry * 1.005.
        mgr.update(102.5);
        assert!((mgr.position().unwrap().stop_loss - 100.5).abs() < 1e-9);

        // +3% band: entry * 1.01.
        mgr.update(103.5);
        assert!((mgr.position().unwrap().stop_loss - 101.0).abs() < 1e-9);
    }

    #[test]
    fn stop_never_loosens() {
        let mut mgr = manager_with(long_position(100.0, 96.0, 200.0));
        let mut last_stop = mgr.position().unwrap().stop_loss;

        // Arbitrary walk: up into the bands, then back down.
        for price in [103.5, 99.0, 101.5, 95.0, 104.0, 90.0] {
            mgr.update(price);
            let stop = mgr.position().unwrap().stop_loss;
            assert!(stop >= last_stop, "stop loosened at price {price}");
            last_stop = stop;
        }
    }

    #[test]
    fn short_ratchet_moves_down_only() {
        let mut pos = long_position(100.0, 104.0, 90.0);
        pos.direction = Direction::Short;
        let mut mgr = manager_with(pos);

        // +3% profit for a short = price at 96.5; stop locks to entry*0.99.
        mgr.update(96.5);
        assert!((mgr.position().unwrap().stop_loss - 99.0).abs() < 1e-9);

        // Price recovering does not loosen the stop.
        mgr.update(100.0);
        assert!((mgr.position().unwrap().stop_loss - 99.0).abs() < 1e-9);
    }

    #[test]
    fn exit_priority_stop_first() {
        // Construct stop above target so one price satisfies both.
        let mgr = manager_with(long_position(100.0, 105.0, 103.0));
        assert_eq!(
            mgr.check_exit(104.0),
            ExitCheck::Exit(ExitReason::StopLoss)
        );
    }

    #[test]
    fn exit_on_target() {
        let mgr = manager_with(long_position(100.0, 96.0, 106.0));
        assert_eq!(
            mgr.check_exit(106.5),
            ExitCheck::Exit(ExitReason::TakeProfit)
        );
    }

    #[test]
    fn exit_on_time_limit() {
        let mut mgr = manager_with(long_position(100.0, 96.0, 106.0));
        assert_eq!(mgr.check_exit(100.0), ExitCheck::Hold);

        // 25 hours after entry, price still between stop and target.
        mgr.sim_time = Some(
            DateTime::parse_from_rfc3339("2024-01-16T01:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
        );
        assert_eq!(
            mgr.check_exit(100.0),
            ExitCheck::Exit(ExitReason::TimeLimit)
        );
    }

    #[test]
    fn short_exit_conditions_mirror() {
        let mut pos = long_position(100.0, 104.0, 94.0);
        pos.direction = Direction::Short;
        let mgr = manager_with(pos);

        assert_eq!(
            mgr.check_exit(104.5),
            ExitCheck::Exit(ExitReason::StopLoss)
        );
        assert_eq!(
            mgr.check_exit(93.5),
            ExitCheck::Exit(ExitReason::TakeProfit)
        );
        assert_eq!(mgr.check_exit(100.0), ExitCheck::Hold);
    }

    #[test]
    fn close_produces_signed_result() {
        let mut mgr = manager_with(long_position(100.0, 96.0, 106.0));
        let result = mgr.close(103.0, ExitReason::TakeProfit).unwrap();

        assert!((result.profit_pct - 0.03).abs() < 1e-12);
        assert!((result.profit_amount - 3.0 * 500.0).abs() < 1e-9);
        assert_eq!(result.exit_reason, ExitReason::TakeProfit);
        assert!(!mgr.has_position());

        // Short close flips the sign.
        let mut pos = long_position(100.0, 104.0, 94.0);
        pos.direction = Direction::Short;
        let mut mgr = manager_with(pos);
        let result = mgr.close(103.0, ExitReason::StopLoss).unwrap();
        assert!((result.profit_pct + 0.03).abs() < 1e-12);
        assert!(result.profit_amount < 0.0);
    }
}

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::config::default_deny_list;
use crate::core::kelly::{self, Sizing};
use crate::core::pattern;
use crate::models::{DayOfWeek, Direction, PatternLabel, PriceSeries, RiskLevel};
use crate::stats::PatternStats;

/// Sole statistical gate: the historical win rate must clear this before
/// a position opens. Kept above coin-flip odds to leave margin for
/// estimation noise in the tables.
pub const WIN_RATE_THRESHOLD: f64 = 0.55;

/// Outcome of one decision cycle.
#[derive(Debug, Clone)]
pub enum TradeDecision {
    Open {
        direction: Direction,
        size_fraction: f64,
        pattern: PatternLabel,
        sizing: Sizing,
    },
    Skip {
        pattern: PatternLabel,
        reason: SkipReason,
    },
}

impl TradeDecision {
    pub fn is_open(&self) -> bool {
        matches!(self, TradeDecision::Open { .. })
    }

    pub fn size_fraction(&self) -> f64 {
        match self {
            TradeDecision::Open { size_fraction, .. } => *size_fraction,
            TradeDecision::Skip { .. } => 0.0,
        }
    }

    pub fn direction(&self) -> Option<Direction> {
        match self {
            TradeDecision::Open { direction, .. } => Some(*direction),
            TradeDecision::Skip { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Fewer than two price points, so no pattern to act on.
    InsufficientData,
    /// The (previous day, pattern) pair is on the deny-list.
    Denied,
    /// No stats cell exists for the pair; unknown edge is not tradeable.
    NoStatisticalData,
    /// A cell exists but its win rate does not clear the threshold.
    WeakEdge,
}

/// Decides whether to open a position from recent price action and the
/// historical pattern tables. Stateless between calls; the stats snapshot
/// is passed in per decision.
pub struct DecisionEngine {
    risk_level: RiskLevel,
    /// (day the pattern was observed, pattern) pairs that never trade,
    /// whatever the tables say. These combinations historically showed
    /// reversed edge despite passing the win-rate filter.
    deny_list: HashSet<(DayOfWeek, PatternLabel)>,
}

impl DecisionEngine {
    pub fn new(risk_level: RiskLevel) -> Self {
        Self::with_deny_list(risk_level, default_deny_list())
    }

    pub fn with_deny_list(
        risk_level: RiskLevel,
        deny_list: Vec<(DayOfWeek, PatternLabel)>,
    ) -> Self {
        Self {
            risk_level,
            deny_list: deny_list.into_iter().collect(),
        }
    }

    pub fn risk_level(&self) -> RiskLevel {
        self.risk_level
    }

    /// Evaluate a decision for a trade taken on `day`. The price history
    /// covers the previous day's action; its pattern is what the stats
    /// tables key on.
    pub fn should_trade(
        &self,
        prices: &PriceSeries,
        day: DayOfWeek,
        stats: &PatternStats,
    ) -> TradeDecision {
        let observed = pattern::classify(prices);
        if observed == PatternLabel::InsufficientData {
            return TradeDecision::Skip {
                pattern: observed,
                reason: SkipReason::InsufficientData,
            };
        }

        let lookup_day = day.previous();
        if self.deny_list.contains(&(lookup_day, observed)) {
            return TradeDecision::Skip {
                pattern: observed,
                reason: SkipReason::Denied,
            };
        }

        let entry = match stats.get(lookup_day, observed) {
            Some(e) => e,
            None => {
                return TradeDecision::Skip {
                    pattern: observed,
                    reason: SkipReason::NoStatisticalData,
                }
            }
        };

        if entry.win_rate <= WIN_RATE_THRESHOLD {
            return TradeDecision::Skip {
                pattern: observed,
                reason: SkipReason::WeakEdge,
            };
        }

        // Only long entries are emitted; the short side of the tables was
        // never modeled. Lifecycle handling supports both directions.
        let sizing = kelly::size_position(entry, self.risk_level);
        TradeDecision::Open {
            direction: Direction::Long,
            size_fraction: sizing.applied_fraction,
            pattern: observed,
            sizing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::PatternStatEntry;

    fn entry(win_rate: f64, return_rate: f64) -> PatternStatEntry {
        PatternStatEntry {
            win_rate,
            return_rate,
            volatility: None,
            sample_size: Some(100),
        }
    }

    fn stats_with(day: DayOfWeek, pattern: PatternLabel, e: PatternStatEntry) -> PatternStats {
        let mut stats = PatternStats::new();
        stats.insert(day, pattern, e);
        stats
    }

    fn rising() -> PriceSeries {
        PriceSeries::new(vec![100.0, 105.0])
    }

    #[test]
    fn opens_long_on_strong_sunday_edge() {
        // Monday trade reads Sunday's continuous_rise cell.
        let stats = stats_with(
            DayOfWeek::Sunday,
            PatternLabel::ContinuousRise,
            entry(0.65, 0.008),
        );
        let engine = DecisionEngine::new(RiskLevel::Medium);
        let decision = engine.should_trade(&rising(), DayOfWeek::Monday, &stats);

        assert!(decision.is_open());
        assert_eq!(decision.direction(), Some(Direction::Long));
        assert!(decision.size_fraction() > 0.0);
    }

    #[test]
    fn skips_without_price_history() {
        let stats = PatternStats::new();
        let engine = DecisionEngine::new(RiskLevel::Medium);
        let decision = engine.should_trade(
            &PriceSeries::new(vec![100.0]),
            DayOfWeek::Monday,
            &stats,
        );
        assert!(matches!(
            decision,
            TradeDecision::Skip {
                reason: SkipReason::InsufficientData,
                ..
            }
        ));
        assert_eq!(decision.size_fraction(), 0.0);
        assert_eq!(decision.direction(), None);
    }

    #[test]
    fn deny_list_beats_strong_stats() {
        // Saturday trade + rise pattern maps to the denied (Friday,
        // ContinuousRise) cell even with a stellar win rate present.
        let stats = stats_with(
            DayOfWeek::Friday,
            PatternLabel::ContinuousRise,
            entry(0.90, 0.02),
        );
        let engine = DecisionEngine::new(RiskLevel::High);
        let decision = engine.should_trade(&rising(), DayOfWeek::Saturday, &stats);
        assert!(matches!(
            decision,
            TradeDecision::Skip {
                reason: SkipReason::Denied,
                ..
            }
        ));
    }

    #[test]
    fn second_default_deny_pair() {
        let stats = stats_with(
            DayOfWeek::Saturday,
            PatternLabel::FallThenRise,
            entry(0.90, 0.02),
        );
        let engine = DecisionEngine::new(RiskLevel::High);
        let falling_then_rising = PriceSeries::new(vec![100.0, 95.0, 102.0]);
        let decision =
            engine.should_trade(&falling_then_rising, DayOfWeek::Sunday, &stats);
        assert!(matches!(
            decision,
            TradeDecision::Skip {
                reason: SkipReason::Denied,
                ..
            }
        ));
    }

    #[test]
    fn skips_when_no_stats_cell() {
        let stats = PatternStats::new();
        let engine = DecisionEngine::new(RiskLevel::Medium);
        let decision = engine.should_trade(&rising(), DayOfWeek::Wednesday, &stats);
        assert!(matches!(
            decision,
            TradeDecision::Skip {
                reason: SkipReason::NoStatisticalData,
                ..
            }
        ));
    }

    #[test]
    fn threshold_is_strict() {
        let stats = stats_with(
            DayOfWeek::Sunday,
            PatternLabel::ContinuousRise,
            entry(0.55, 0.008),
        );
        let engine = DecisionEngine::new(RiskLevel::Medium);
        let decision = engine.should_trade(&rising(), DayOfWeek::Monday, &stats);
        assert!(matches!(
            decision,
            TradeDecision::Skip {
                reason: SkipReason::WeakEdge,
                ..
            }
        ));
    }

    #[test]
    fn sample_table_end_to_end() {
        use crate::test_helpers::sample_pattern_stats;

        let engine = DecisionEngine::new(RiskLevel::Medium);
        let stats = sample_pattern_stats();

        // Monday over a rising Sunday: 65% win rate, opens long.
        let decision = engine.should_trade(&rising(), DayOfWeek::Monday, &stats);
        assert!(decision.is_open());

        // Sunday over a Saturday fall-then-rise: deny-listed.
        let v = PriceSeries::new(vec![100.0, 95.0, 102.0]);
        let decision = engine.should_trade(&v, DayOfWeek::Sunday, &stats);
        assert!(matches!(
            decision,
            TradeDecision::Skip {
                reason: SkipReason::Denied,
                ..
            }
        ));
    }

    #[test]
    fn custom_deny_list_replaces_defaults() {
        let stats = stats_with(
            DayOfWeek::Friday,
            PatternLabel::ContinuousRise,
            entry(0.65, 0.008),
        );
        let engine = DecisionEngine::with_deny_list(RiskLevel::Medium, vec![]);
        let decision = engine.should_trade(&rising(), DayOfWeek::Saturday, &stats);
        assert!(decision.is_open());
    }
}

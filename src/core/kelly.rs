use serde::{Deserialize, Serialize};

use crate::models::RiskLevel;
use crate::stats::PatternStatEntry;

/// Normalizes a fractional next-day return into the per-unit-of-capital
/// odds convention the Kelly formula expects. Matches the scaling the
/// historical stats were calibrated against.
const RETURN_UNIT: f64 = 0.01;
/// Hard ceiling on the deployed fraction, regardless of risk level.
const MAX_FRACTION: f64 = 0.5;

/// Sizing outcome with the intermediate Kelly value kept around for
/// logging and diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sizing {
    pub full_kelly: f64,
    pub applied_fraction: f64,
    pub win_rate: f64,
    pub return_rate: f64,
    pub risk_level: RiskLevel,
}

/// Capped Kelly position sizing from a pattern's historical edge.
///
/// A non-positive expected return forces the fraction to zero no matter
/// how high the win rate is; the Kelly formula degenerates there. The
/// applied fraction is `kelly * risk_multiplier`, never above
/// `MAX_FRACTION`.
pub fn size_position(entry: &PatternStatEntry, risk: RiskLevel) -> Sizing {
    let full_kelly = if entry.return_rate > 0.0 {
        let odds = entry.return_rate / RETURN_UNIT;
        (entry.win_rate - (1.0 - entry.win_rate) / odds).max(0.0)
    } else {
        0.0
    };

    let applied = (full_kelly * risk.multiplier()).min(MAX_FRACTION);

    Sizing {
        full_kelly,
        applied_fraction: applied,
        win_rate: entry.win_rate,
        return_rate: entry.return_rate,
        risk_level: risk,
    }
}

/// The deployable fraction of capital, in `[0, 0.5]`.
pub fn size_fraction(entry: &PatternStatEntry, risk: RiskLevel) -> f64 {
    size_position(entry, risk).applied_fraction
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(win_rate: f64, return_rate: f64) -> PatternStatEntry {
        PatternStatEntry {
            win_rate,
            return_rate,
            volatility: None,
            sample_size: Some(100),
        }
    }

    #[test]
    fn zero_when_return_rate_non_positive() {
        assert_eq!(size_fraction(&entry(0.95, 0.0), RiskLevel::High), 0.0);
        assert_eq!(size_fraction(&entry(0.95, -0.004), RiskLevel::High), 0.0);
    }

    #[test]
    fn known_kelly_value() {
        // win_rate 0.65, return 0.008 => odds 0.8
        // kelly = 0.65 - 0.35/0.8 = 0.2125; medium => 0.2125 * 0.25
        let s = size_position(&entry(0.65, 0.008), RiskLevel::Medium);
        assert!((s.full_kelly - 0.2125).abs() < 1e-9);
        assert!((s.applied_fraction - 0.053125).abs() < 1e-9);
    }

    #[test]
    fn negative_kelly_clamps_to_zero() {
        // win_rate 0.45, return 0.002 => kelly = 0.45 - 0.55/0.2 < 0
        assert_eq!(size_fraction(&entry(0.45, 0.002), RiskLevel::High), 0.0);
    }

    #[test]
    fn hard_cap_at_half() {
        let s = size_position(&entry(0.999, 10.0), RiskLevel::High);
        assert!(s.applied_fraction <= 0.5);

        // An extreme edge under a big multiplier still respects the cap.
        let e = entry(1.0, 100.0);
        assert_eq!(size_fraction(&e, RiskLevel::High), 0.5);
    }

    #[test]
    fn monotone_in_win_rate() {
        let mut last = 0.0;
        for wr in [0.40, 0.50, 0.60, 0.70, 0.80, 0.90] {
            let f = size_fraction(&entry(wr, 0.008), RiskLevel::Medium);
            assert!(f >= last, "fraction decreased at win_rate {wr}");
            last = f;
        }
    }

    #[test]
    fn risk_multipliers_order_fractions() {
        let e = entry(0.65, 0.008);
        let low = size_fraction(&e, RiskLevel::Low);
        let medium = size_fraction(&e, RiskLevel::Medium);
        let high = size_fraction(&e, RiskLevel::High);
        assert!(low < medium && medium < high);
    }
}

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::models::Direction;

const HIGH_VOL_THRESHOLD: f64 = 0.025;
const LOW_VOL_THRESHOLD: f64 = 0.02;
// The multiplier shrinks as volatility grows, so high-volatility days get
// a proportionally tighter stop. Deliberately left as calibrated; see
// DESIGN.md before changing.
const HIGH_VOL_MULTIPLIER: f64 = 1.5;
const MID_VOL_MULTIPLIER: f64 = 1.8;
const LOW_VOL_MULTIPLIER: f64 = 2.0;
/// Planned profit distance per unit of planned loss distance.
const REWARD_RISK_RATIO: f64 = 1.5;

/// Fallback daily volatility when the day has no entry in the table.
pub const DEFAULT_VOLATILITY: f64 = 0.02;

/// Initial stop/target prices for a new position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopPlan {
    pub stop_loss: f64,
    pub take_profit: f64,
    /// Fractional stop distance from entry.
    pub stop_pct: f64,
    pub multiplier: f64,
}

fn volatility_multiplier(day_volatility: f64) -> f64 {
    if day_volatility > HIGH_VOL_THRESHOLD {
        HIGH_VOL_MULTIPLIER
    } else if day_volatility < LOW_VOL_THRESHOLD {
        LOW_VOL_MULTIPLIER
    } else {
        MID_VOL_MULTIPLIER
    }
}

/// Initial stop-loss price from the day's expected volatility.
///
/// Long stops sit below entry, short stops symmetrically above. Zero or
/// negative volatility is degraded market data, not a caller bug: it
/// collapses the stop distance toward zero rather than erroring.
pub fn stop_loss(
    entry_price: f64,
    day_volatility: f64,
    direction: Direction,
) -> Result<f64, EngineError> {
    if entry_price <= 0.0 {
        return Err(EngineError::InvalidArgument(format!(
            "entry price must be positive, got {entry_price}"
        )));
    }

    let stop_pct = day_volatility.max(0.0) * volatility_multiplier(day_volatility);
    Ok(match direction {
        Direction::Long => entry_price * (1.0 - stop_pct),
        Direction::Short => entry_price * (1.0 + stop_pct),
    })
}

/// Take-profit price at a fixed reward-to-risk ratio from the stop
/// distance.
pub fn take_profit(entry_price: f64, stop_loss: f64, direction: Direction) -> f64 {
    let risk_pct = (entry_price - stop_loss).abs() / entry_price;
    match direction {
        Direction::Long => entry_price * (1.0 + risk_pct * REWARD_RISK_RATIO),
        Direction::Short => entry_price * (1.0 - risk_pct * REWARD_RISK_RATIO),
    }
}

/// Stop and target for a new position in one shot.
pub fn plan(
    entry_price: f64,
    day_volatility: f64,
    direction: Direction,
) -> Result<StopPlan, EngineError> {
    let stop = stop_loss(entry_price, day_volatility, direction)?;
    let target = take_profit(entry_price, stop, direction);
    Ok(StopPlan {
        stop_loss: stop,
        take_profit: target,
        stop_pct: (entry_price - stop).abs() / entry_price,
        multiplier: volatility_multiplier(day_volatility),
    })
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Perpetual-swap funding settles three times per day.
const PERIODS_PER_DAY: f64 = 3.0;

/// One funding settlement, newest first when supplied by the repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundingRateRecord {
    pub funding_rate: f64,
    pub funding_time: DateTime<Utc>,
}

/// Estimated cost of carrying a position across funding settlements.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundingCost {
    pub total_cost: f64,
    pub average_rate: f64,
    pub periods_count: usize,
    pub estimated_daily_cost: f64,
    /// Total cost as a percentage of position size.
    pub cost_percentage: f64,
    pub latest_rate: f64,
    pub latest_time: Option<DateTime<Utc>>,
}

impl FundingCost {
    pub fn zero() -> Self {
        Self {
            total_cost: 0.0,
            average_rate: 0.0,
            periods_count: 0,
            estimated_daily_cost: 0.0,
            cost_percentage: 0.0,
            latest_rate: 0.0,
            latest_time: None,
        }
    }
}

/// Summarize funding cost over the supplied settlement records. Pure; the
/// caller fetches the records for whatever holding window it cares about.
pub fn funding_cost(records: &[FundingRateRecord], position_size: f64) -> FundingCost {
    if records.is_empty() {
        return FundingCost::zero();
    }

    let total_cost: f64 = records.iter().map(|r| position_size * r.funding_rate).sum();
    let average_rate =
        records.iter().map(|r| r.funding_rate).sum::<f64>() / records.len() as f64;
    let estimated_daily_cost = average_rate * position_size * PERIODS_PER_DAY;
    let cost_percentage = if position_size > 0.0 {
        total_cost / position_size * 100.0
    } else {
        0.0
    };

    FundingCost {
        total_cost: round6(total_cost),
        average_rate: round8(average_rate),
        periods_count: records.len(),
        estimated_daily_cost: round6(estimated_daily_cost),
        cost_percentage: round4(cost_percentage),
        latest_rate: records[0].funding_rate,
        latest_time: Some(records[0].funding_time),
    }
}

fn round4(x: f64) -> f64 {
    (x * 1e4).round() / 1e4
}

fn round6(x: f64) -> f64 {
    (x * 1e6).round() / 1e6
}

fn round8(x: f64) -> f64 {
    (x * 1e8).round() / 1e8
}

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Long,
    Short,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => write!(f, "long"),
            Direction::Short => write!(f, "short"),
        }
    }
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Long => "long",
            Direction::Short => "short",
        }
    }

    /// +1.0 for longs, -1.0 for shorts. Multiplies raw price moves into
    /// signed profit.
    pub fn sign(&self) -> f64 {
        match self {
            Direction::Long => 1.0,
            Direction::Short => -1.0,
        }
    }
}

/// Coarse shape of a short closing-price sequence. Wire names match the
/// historical stats tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternLabel {
    ContinuousRise,
    ContinuousFall,
    RiseThenFall,
    FallThenRise,
    InsufficientData,
}

impl fmt::Display for PatternLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl PatternLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternLabel::ContinuousRise => "continuous_rise",
            PatternLabel::ContinuousFall => "continuous_fall",
            PatternLabel::RiseThenFall => "rise_then_fall",
            PatternLabel::FallThenRise => "fall_then_rise",
            PatternLabel::InsufficientData => "insufficient_data",
        }
    }
}

impl FromStr for PatternLabel {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "continuous_rise" => Ok(PatternLabel::ContinuousRise),
            "continuous_fall" => Ok(PatternLabel::ContinuousFall),
            "rise_then_fall" => Ok(PatternLabel::RiseThenFall),
            "fall_then_rise" => Ok(PatternLabel::FallThenRise),
            "insufficient_data" => Ok(PatternLabel::InsufficientData),
            other => Err(EngineError::InvalidArgument(format!(
                "unknown pattern label: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Fraction of the raw Kelly value actually deployed.
    pub fn multiplier(&self) -> f64 {
        match self {
            RiskLevel::Low => 0.10,
            RiskLevel::Medium => 0.25,
            RiskLevel::High => 0.50,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(RiskLevel::Low),
            "medium" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            other => Err(EngineError::InvalidArgument(format!(
                "unknown risk level: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
    TimeLimit,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::StopLoss => write!(f, "stop_loss"),
            ExitReason::TakeProfit => write!(f, "take_profit"),
            ExitReason::TimeLimit => write!(f, "time_limit"),
        }
    }
}

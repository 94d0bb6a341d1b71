pub mod decision;

pub use decision::{DecisionEngine, SkipReason, TradeDecision, WIN_RATE_THRESHOLD};

pub mod lifecycle;
pub mod summary;

pub use lifecycle::{ExitCheck, PositionManager, PositionUpdate};
pub use summary::{summarize, TradeSummary};

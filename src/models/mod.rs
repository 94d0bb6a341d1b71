pub mod day;
pub mod direction;
pub mod position;
pub mod series;

pub use day::{DayOfWeek, ALL_DAYS};
pub use direction::*;
pub use position::{Position, TradeResult};
pub use series::PriceSeries;

pub mod funding;
pub mod kelly;
pub mod pattern;
pub mod stop_loss;

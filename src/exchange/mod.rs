pub mod okx;

pub use okx::OkxClient;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::PriceSeries;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "buy"),
            OrderSide::Sell => write!(f, "sell"),
        }
    }
}

/// Market order request in base-currency units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRequest {
    pub side: OrderSide,
    /// Base-currency quantity (BTC for BTC-USDT).
    pub size: f64,
    /// Reference price at decision time; market orders fill at the book.
    pub reference_price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderResult {
    pub order_id: String,
}

/// Market-data and order access for one trading pair. Constructed once at
/// startup and passed by reference; never reached through global state.
#[async_trait]
pub trait ExchangeGateway: Send + Sync {
    async fn get_current_price(&mut self) -> Result<f64>;
    /// Closing prices for the last `hours` hourly candles, time-ascending.
    async fn get_price_history(&mut self, hours: usize) -> Result<PriceSeries>;
    /// Available quote-currency balance.
    async fn get_balance(&mut self) -> Result<f64>;
    async fn place_order(&mut self, order: &OrderRequest) -> Result<OrderResult>;
}

use serde::{Deserialize, Serialize};

/// Time-ascending closing prices for one symbol.
///
/// Wraps `Vec<f64>` with the few accessors pattern analysis needs; the
/// caller owns fetching and ordering (the gateway re-sorts exchange data
/// ascending before building one of these).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PriceSeries {
    closes: Vec<f64>,
}

impl PriceSeries {
    pub fn new(closes: Vec<f64>) -> Self {
        Self { closes }
    }

    pub fn len(&self) -> usize {
        self.closes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }

    pub fn first(&self) -> Option<f64> {
        self.closes.first().copied()
    }

    pub fn last(&self) -> Option<f64> {
        self.closes.last().copied()
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.closes.get(index).copied()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.closes
    }

    /// Split at the floor midpoint. For odd lengths the middle element
    /// lands in the second half.
    pub fn halves(&self) -> (&[f64], &[f64]) {
        self.closes.split_at(self.closes.len() / 2)
    }
}

impl From<Vec<f64>> for PriceSeries {
    fn from(closes: Vec<f64>) -> Self {
        Self::new(closes)
    }
}

impl From<&[f64]> for PriceSeries {
    fn from(closes: &[f64]) -> Self {
        Self::new(closes.to_vec())
    }
}

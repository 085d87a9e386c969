use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, Distribution};

/// Recent period returns, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VolatilitySeries {
    pub returns: Vec<f64>,
}

impl VolatilitySeries {
    pub fn new(returns: Vec<f64>) -> Self {
        Self { returns }
    }

    /// Builds period returns from a close-price series, oldest first.
    pub fn from_prices(prices: &[f64]) -> Self {
        let returns = prices
            .windows(2)
            .filter(|pair| pair[0] != 0.0)
            .map(|pair| (pair[1] - pair[0]) / pair[0])
            .collect();
        Self { returns }
    }

    pub fn len(&self) -> usize {
        self.returns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.returns.is_empty()
    }

    pub fn has_non_finite(&self) -> bool {
        self.returns.iter().any(|r| !r.is_finite())
    }

    /// Sample standard deviation of the newest `periods` returns.
    ///
    /// `None` when fewer than `periods` samples (or fewer than two) exist.
    pub fn realized_volatility(&self, periods: usize) -> Option<f64> {
        if periods < 2 || self.returns.len() < periods {
            return None;
        }
        Self::std_dev(&self.returns[self.returns.len() - periods..])
    }

    /// Realized volatility of the newest `recent_periods` returns over that of
    /// the `baseline_periods` returns immediately before them.
    ///
    /// The windows do not overlap, so a spike cannot inflate its own baseline.
    pub fn volatility_ratio(&self, recent_periods: usize, baseline_periods: usize) -> Option<f64> {
        if recent_periods < 2 || baseline_periods < 2 {
            return None;
        }
        let len = self.returns.len();
        if len < recent_periods + baseline_periods {
            return None;
        }
        let split = len - recent_periods;
        let recent = Self::std_dev(&self.returns[split..])?;
        let baseline = Self::std_dev(&self.returns[split - baseline_periods..split])?;
        if baseline <= 0.0 {
            return None;
        }
        Some(recent / baseline)
    }

    fn std_dev(window: &[f64]) -> Option<f64> {
        Data::new(window.to_vec()).std_dev()
    }
}

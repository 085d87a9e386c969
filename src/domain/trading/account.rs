use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::errors::RiskError;

/// Read-only view of one account, refreshed by the execution engine before
/// every evaluation. Nothing in the pipeline writes to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub total_balance: Decimal,
    pub available_balance: Decimal,
    /// High-water mark as known to the engine.
    pub peak_balance: Decimal,
    pub open_position_count: usize,
    /// Open notional per symbol.
    #[serde(default)]
    pub open_exposure: HashMap<String, Decimal>,
    /// Wall-clock instant the snapshot was taken; evaluation time.
    pub as_of: DateTime<Utc>,
}

impl AccountSnapshot {
    pub fn new(total_balance: Decimal, as_of: DateTime<Utc>) -> Self {
        Self {
            total_balance,
            available_balance: total_balance,
            peak_balance: total_balance,
            open_position_count: 0,
            open_exposure: HashMap::new(),
            as_of,
        }
    }

    pub fn with_available_balance(mut self, available: Decimal) -> Self {
        self.available_balance = available;
        self
    }

    pub fn with_peak_balance(mut self, peak: Decimal) -> Self {
        self.peak_balance = peak;
        self
    }

    /// Adds an open position and keeps `open_position_count` in step.
    pub fn with_position(mut self, symbol: impl Into<String>, notional: Decimal) -> Self {
        self.open_exposure.insert(symbol.into(), notional);
        self.open_position_count = self.open_exposure.len();
        self
    }

    /// `(peak - total) / peak` against the snapshot's own peak.
    pub fn drawdown_pct(&self) -> Decimal {
        if self.peak_balance <= Decimal::ZERO || self.total_balance >= self.peak_balance {
            return Decimal::ZERO;
        }
        (self.peak_balance - self.total_balance) / self.peak_balance
    }

    pub fn exposure_for(&self, symbol: &str) -> Decimal {
        self.open_exposure.get(symbol).copied().unwrap_or(Decimal::ZERO)
    }

    /// Symbols with a non-zero open notional.
    pub fn open_symbols(&self) -> impl Iterator<Item = &str> {
        self.open_exposure
            .iter()
            .filter(|(_, notional)| !notional.is_zero())
            .map(|(symbol, _)| symbol.as_str())
    }

    pub fn validate(&self) -> Result<(), RiskError> {
        if self.total_balance < Decimal::ZERO {
            return Err(RiskError::malformed_snapshot(format!(
                "total balance is negative: {}",
                self.total_balance
            )));
        }
        if self.available_balance < Decimal::ZERO {
            return Err(RiskError::malformed_snapshot(format!(
                "available balance is negative: {}",
                self.available_balance
            )));
        }
        if self.available_balance > self.total_balance {
            return Err(RiskError::malformed_snapshot(format!(
                "available balance {} exceeds total balance {}",
                self.available_balance, self.total_balance
            )));
        }
        if self.peak_balance < Decimal::ZERO {
            return Err(RiskError::malformed_snapshot(format!(
                "peak balance is negative: {}",
                self.peak_balance
            )));
        }
        if let Some((symbol, notional)) = self
            .open_exposure
            .iter()
            .find(|(_, notional)| **notional < Decimal::ZERO)
        {
            return Err(RiskError::malformed_snapshot(format!(
                "negative exposure {} for {}",
                notional, symbol
            )));
        }
        Ok(())
    }
}

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::errors::RiskError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Long,
    Short,
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeSide::Long => write!(f, "LONG"),
            TradeSide::Short => write!(f, "SHORT"),
        }
    }
}

/// A trade candidate as it travels through the risk layers.
///
/// Layers own disjoint fields: Position Sizing and Volatility Adjustment write
/// `size`, Leverage Control writes `leverage`, Stop-Loss Management and
/// Volatility Adjustment write `stop_price`. Everything else is read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeProposal {
    pub symbol: String,
    pub side: TradeSide,
    pub entry_price: Decimal,
    /// Quote-currency notional before leverage. Advisory on input.
    #[serde(default)]
    pub size: Option<Decimal>,
    /// Requested on input, the approved value on output.
    pub leverage: Decimal,
    /// Signal confidence in [0, 1].
    pub confidence: f64,
    #[serde(default)]
    pub stop_price: Option<Decimal>,
    #[serde(default)]
    pub take_profit: Option<Decimal>,
    /// Last traded price when the proposal was built, for flash-crash checks.
    #[serde(default)]
    pub current_price: Option<Decimal>,
    /// Effective fraction of available balance committed by Position Sizing.
    #[serde(default)]
    pub risk_fraction: Option<Decimal>,
}

impl TradeProposal {
    pub fn new(symbol: impl Into<String>, side: TradeSide, entry_price: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            entry_price,
            size: None,
            leverage: Decimal::ONE,
            confidence: 1.0,
            stop_price: None,
            take_profit: None,
            current_price: None,
            risk_fraction: None,
        }
    }

    pub fn with_leverage(mut self, leverage: Decimal) -> Self {
        self.leverage = leverage;
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_size(mut self, size: Decimal) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_stop_price(mut self, stop_price: Decimal) -> Self {
        self.stop_price = Some(stop_price);
        self
    }

    pub fn with_take_profit(mut self, take_profit: Decimal) -> Self {
        self.take_profit = Some(take_profit);
        self
    }

    pub fn with_current_price(mut self, current_price: Decimal) -> Self {
        self.current_price = Some(current_price);
        self
    }

    /// Position notional after leverage.
    pub fn exposure(&self) -> Decimal {
        self.size.unwrap_or(Decimal::ZERO) * self.leverage
    }

    /// Reject proposals no layer can reason about.
    pub fn validate(&self) -> Result<(), RiskError> {
        if self.symbol.trim().is_empty() {
            return Err(RiskError::malformed_proposal("symbol is empty"));
        }
        if self.entry_price <= Decimal::ZERO {
            return Err(RiskError::malformed_proposal(format!(
                "entry price must be positive, got {}",
                self.entry_price
            )));
        }
        if self.leverage < Decimal::ONE {
            return Err(RiskError::malformed_proposal(format!(
                "requested leverage must be >= 1, got {}",
                self.leverage
            )));
        }
        if !self.confidence.is_finite() || !(0.0..=1.0).contains(&self.confidence) {
            return Err(RiskError::malformed_proposal(format!(
                "confidence must be within [0, 1], got {}",
                self.confidence
            )));
        }
        if let Some(size) = self.size
            && size <= Decimal::ZERO
        {
            return Err(RiskError::malformed_proposal(format!(
                "advisory size must be positive, got {}",
                size
            )));
        }
        if let Some(stop) = self.stop_price
            && stop <= Decimal::ZERO
        {
            return Err(RiskError::malformed_proposal(format!(
                "stop price must be positive, got {}",
                stop
            )));
        }
        Ok(())
    }
}

/// Outcome of a closed position, reported by the execution engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeResult {
    pub symbol: String,
    pub is_win: bool,
    pub realized_pnl: Decimal,
    pub closed_at: DateTime<Utc>,
    /// Account balance right after the close, when the engine knows it.
    #[serde(default)]
    pub balance_after: Option<Decimal>,
}

impl TradeResult {
    pub fn new(symbol: impl Into<String>, realized_pnl: Decimal, closed_at: DateTime<Utc>) -> Self {
        Self {
            symbol: symbol.into(),
            is_win: realized_pnl > Decimal::ZERO,
            realized_pnl,
            closed_at,
            balance_after: None,
        }
    }

    pub fn with_balance_after(mut self, balance: Decimal) -> Self {
        self.balance_after = Some(balance);
        self
    }
}

/// Infrastructure fault reported from outside the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriticalFailureSignal {
    pub reason: String,
    pub at: DateTime<Utc>,
}

impl CriticalFailureSignal {
    pub fn new(reason: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            reason: reason.into(),
            at,
        }
    }
}

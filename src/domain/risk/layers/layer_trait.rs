use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::domain::errors::RiskError;
use crate::domain::market::MarketConditions;
use crate::domain::risk::events::{RiskEvent, RiskObserver};
use crate::domain::trading::account::AccountSnapshot;
use crate::domain::trading::types::{TradeProposal, TradeResult};

/// Result of one layer's evaluation
#[derive(Debug, Clone, PartialEq)]
pub enum LayerVerdict {
    /// The proposal passes, possibly with fields rewritten by the layer
    Approve(TradeProposal),
    /// The trade is blocked with a human-readable reason
    Reject(String),
}

impl LayerVerdict {
    pub fn is_approved(&self) -> bool {
        matches!(self, LayerVerdict::Approve(_))
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, LayerVerdict::Reject(_))
    }

    pub fn rejection_reason(&self) -> Option<&str> {
        match self {
            LayerVerdict::Reject(reason) => Some(reason),
            LayerVerdict::Approve(_) => None,
        }
    }

    pub fn proposal(&self) -> Option<&TradeProposal> {
        match self {
            LayerVerdict::Approve(proposal) => Some(proposal),
            LayerVerdict::Reject(_) => None,
        }
    }
}

/// Read-only inputs shared by every layer during one evaluation.
///
/// `drawdown_pct` is measured against the Maximum Drawdown layer's peak
/// before the pipeline starts, so every layer sees the same figure.
pub struct EvaluationContext<'a> {
    pub snapshot: &'a AccountSnapshot,
    pub market: &'a MarketConditions,
    pub drawdown_pct: Decimal,
    /// Evaluation instant, taken from the snapshot.
    pub now: DateTime<Utc>,
    observer: &'a dyn RiskObserver,
}

impl<'a> EvaluationContext<'a> {
    pub fn new(
        snapshot: &'a AccountSnapshot,
        market: &'a MarketConditions,
        drawdown_pct: Decimal,
        observer: &'a dyn RiskObserver,
    ) -> Self {
        Self {
            snapshot,
            market,
            drawdown_pct,
            now: snapshot.as_of,
            observer,
        }
    }

    pub fn observer(&self) -> &'a dyn RiskObserver {
        self.observer
    }

    pub fn emit(&self, event: RiskEvent) {
        self.observer.on_event(&event);
    }

    /// Emits the rejection event and builds the verdict.
    pub fn reject(
        &self,
        layer: &'static str,
        proposal: &TradeProposal,
        reason: impl Into<String>,
    ) -> LayerVerdict {
        let reason = reason.into();
        self.emit(RiskEvent::Rejected {
            layer,
            symbol: proposal.symbol.clone(),
            reason: reason.clone(),
        });
        LayerVerdict::Reject(reason)
    }

    /// Emits an adjustment event when `from` and `to` differ.
    pub fn adjusted(
        &self,
        layer: &'static str,
        proposal: &TradeProposal,
        field: &'static str,
        from: Option<Decimal>,
        to: Decimal,
    ) {
        if from != Some(to) {
            self.emit(RiskEvent::Adjusted {
                layer,
                symbol: proposal.symbol.clone(),
                field,
                from,
                to,
            });
        }
    }
}

/// One check or transform in the risk pipeline.
///
/// Layers are run in a fixed order by `RiskManager`. A layer only rewrites
/// the proposal fields it owns and never reads another layer's state.
pub trait RiskLayer: Send {
    /// Stable name, reported with every rejection
    fn name(&self) -> &'static str;

    /// Approve (possibly rewriting the proposal) or reject.
    ///
    /// `Err` is reserved for faults: malformed market inputs or state the
    /// layer cannot reason about. The caller fails closed on it.
    fn evaluate(
        &mut self,
        proposal: TradeProposal,
        ctx: &EvaluationContext<'_>,
    ) -> Result<LayerVerdict, RiskError>;

    /// Result sink for stateful layers. Default: ignore.
    fn record_result(&mut self, _result: &TradeResult, _observer: &dyn RiskObserver) {}

    /// Disabled layers are skipped during evaluation.
    fn is_enabled(&self) -> bool {
        true
    }
}

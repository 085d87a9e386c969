use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::oneshot;

use crate::application::risk_management::risk_manager::{EvaluationVerdict, RiskStatus};
use crate::domain::errors::RiskError;
use crate::domain::market::MarketConditions;
use crate::domain::risk::state::RiskState;
use crate::domain::trading::account::AccountSnapshot;
use crate::domain::trading::types::{CriticalFailureSignal, TradeProposal, TradeResult};

/// Requests processed one at a time by a `RiskService`.
#[derive(Debug)]
pub enum RiskCommand {
    /// Run a proposal through the pipeline
    Evaluate {
        proposal: Box<TradeProposal>,
        snapshot: Box<AccountSnapshot>,
        market: Box<MarketConditions>,
        reply: oneshot::Sender<Result<EvaluationVerdict, RiskError>>,
    },

    /// The execution engine acted on an approval
    RecordApproval { at: DateTime<Utc> },

    /// A position closed
    RecordResult(TradeResult),

    /// External component failure; halts trading
    RecordCriticalFailure(CriticalFailureSignal),

    /// Operator clear of a circuit breaker halt
    ClearHalt {
        at: DateTime<Utc>,
        reply: oneshot::Sender<bool>,
    },

    UpdateBalance(Decimal),

    Status {
        at: DateTime<Utc>,
        reply: oneshot::Sender<RiskStatus>,
    },

    ExportState { reply: oneshot::Sender<RiskState> },
}

impl RiskCommand {
    /// Returns the command name for logging purposes
    pub fn name(&self) -> &'static str {
        match self {
            Self::Evaluate { .. } => "Evaluate",
            Self::RecordApproval { .. } => "RecordApproval",
            Self::RecordResult(_) => "RecordResult",
            Self::RecordCriticalFailure(_) => "RecordCriticalFailure",
            Self::ClearHalt { .. } => "ClearHalt",
            Self::UpdateBalance(_) => "UpdateBalance",
            Self::Status { .. } => "Status",
            Self::ExportState { .. } => "ExportState",
        }
    }
}

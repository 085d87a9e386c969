use thiserror::Error;

use crate::domain::risk::risk_config::RiskConfigError;

/// Faults raised while evaluating or maintaining risk state.
///
/// Policy rejections are not errors: they come back as
/// `EvaluationVerdict::Rejected`. Anything here means the pipeline could not
/// reach a decision, and callers must treat the trade as blocked.
#[derive(Debug, Error)]
pub enum RiskError {
    #[error(transparent)]
    Configuration(#[from] RiskConfigError),

    #[error("Malformed account snapshot: {reason}")]
    MalformedSnapshot { reason: String },

    #[error("Malformed trade proposal: {reason}")]
    MalformedProposal { reason: String },

    #[error("Risk layer {layer} fault: {reason}")]
    LayerFault { layer: &'static str, reason: String },

    #[error("Risk service for account {account} is unavailable")]
    ServiceUnavailable { account: String },
}

impl RiskError {
    pub fn malformed_snapshot(reason: impl Into<String>) -> Self {
        Self::MalformedSnapshot {
            reason: reason.into(),
        }
    }

    pub fn malformed_proposal(reason: impl Into<String>) -> Self {
        Self::MalformedProposal {
            reason: reason.into(),
        }
    }

    pub fn layer_fault(layer: &'static str, reason: impl Into<String>) -> Self {
        Self::LayerFault {
            layer,
            reason: reason.into(),
        }
    }
}

use rust_decimal::Decimal;

use super::layer_trait::{EvaluationContext, LayerVerdict, RiskLayer};
use crate::domain::errors::RiskError;
use crate::domain::risk::risk_config::StopLossConfig;
use crate::domain::trading::types::{TradeProposal, TradeSide};

/// Makes sure every approved trade carries a stop at least as tight as policy.
///
/// Never rejects: a missing stop is synthesized, a looser stop is tightened
/// and a stop on the wrong side of entry is replaced.
pub struct StopLossLayer {
    config: StopLossConfig,
}

impl StopLossLayer {
    pub const NAME: &'static str = "StopLossManagement";

    pub fn new(config: StopLossConfig) -> Self {
        Self { config }
    }

    pub fn policy_stop(&self, side: TradeSide, entry_price: Decimal) -> Decimal {
        match side {
            TradeSide::Long => entry_price * (Decimal::ONE - self.config.stop_loss_pct),
            TradeSide::Short => entry_price * (Decimal::ONE + self.config.stop_loss_pct),
        }
    }
}

impl RiskLayer for StopLossLayer {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn evaluate(
        &mut self,
        mut proposal: TradeProposal,
        ctx: &EvaluationContext<'_>,
    ) -> Result<LayerVerdict, RiskError> {
        let entry = proposal.entry_price;
        let policy = self.policy_stop(proposal.side, entry);

        let stop = match (proposal.side, proposal.stop_price) {
            (_, None) => policy,
            (TradeSide::Long, Some(stop)) if stop >= entry => policy,
            (TradeSide::Short, Some(stop)) if stop <= entry => policy,
            (TradeSide::Long, Some(stop)) => stop.max(policy),
            (TradeSide::Short, Some(stop)) => stop.min(policy),
        };

        ctx.adjusted(Self::NAME, &proposal, "stop_price", proposal.stop_price, stop);
        proposal.stop_price = Some(stop);
        Ok(LayerVerdict::Approve(proposal))
    }
}

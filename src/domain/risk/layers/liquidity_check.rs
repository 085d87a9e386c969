use rust_decimal::Decimal;

use super::layer_trait::{EvaluationContext, LayerVerdict, RiskLayer};
use crate::domain::errors::RiskError;
use crate::domain::risk::risk_config::LiquidityConfig;
use crate::domain::trading::types::TradeProposal;

/// Order-book depth gate and slippage guard on the side the trade consumes.
/// Without a book the proposal passes through.
pub struct LiquidityCheckLayer {
    config: LiquidityConfig,
}

impl LiquidityCheckLayer {
    pub const NAME: &'static str = "LiquidityCheck";

    pub fn new(config: LiquidityConfig) -> Self {
        Self { config }
    }
}

impl RiskLayer for LiquidityCheckLayer {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn evaluate(
        &mut self,
        proposal: TradeProposal,
        ctx: &EvaluationContext<'_>,
    ) -> Result<LayerVerdict, RiskError> {
        let Some(book) = ctx.market.order_book.as_ref() else {
            return Ok(LayerVerdict::Approve(proposal));
        };
        if let Some(level) = book.find_invalid_level() {
            return Err(RiskError::layer_fault(
                Self::NAME,
                format!(
                    "order book level with price {} and quantity {}",
                    level.price, level.quantity
                ),
            ));
        }

        let depth = book.notional_depth(proposal.side, self.config.levels);
        if depth < self.config.min_depth {
            return Ok(ctx.reject(
                Self::NAME,
                &proposal,
                format!(
                    "{} depth {} below minimum {}",
                    proposal.side, depth, self.config.min_depth
                ),
            ));
        }

        let exposure = proposal.exposure();
        let allowed = depth * self.config.max_depth_consumption_pct;
        if exposure > allowed {
            return Ok(ctx.reject(
                Self::NAME,
                &proposal,
                format!(
                    "exposure {} would consume {:.2}% of visible depth {}, maximum {}%",
                    exposure,
                    exposure / depth * Decimal::ONE_HUNDRED,
                    depth,
                    self.config.max_depth_consumption_pct * Decimal::ONE_HUNDRED
                ),
            ));
        }

        Ok(LayerVerdict::Approve(proposal))
    }
}

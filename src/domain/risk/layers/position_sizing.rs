use rust_decimal::Decimal;
use tracing::debug;

use super::layer_trait::{EvaluationContext, LayerVerdict, RiskLayer};
use crate::domain::errors::RiskError;
use crate::domain::risk::drawdown::DrawdownSchedule;
use crate::domain::risk::risk_config::PositionSizingConfig;
use crate::domain::trading::types::TradeProposal;

/// Sizes the trade from available balance, scaled down by drawdown band.
pub struct PositionSizingLayer {
    config: PositionSizingConfig,
    schedule: DrawdownSchedule,
}

impl PositionSizingLayer {
    pub const NAME: &'static str = "PositionSizing";

    pub fn new(config: PositionSizingConfig, schedule: DrawdownSchedule) -> Self {
        Self { config, schedule }
    }
}

impl RiskLayer for PositionSizingLayer {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn evaluate(
        &mut self,
        mut proposal: TradeProposal,
        ctx: &EvaluationContext<'_>,
    ) -> Result<LayerVerdict, RiskError> {
        let multiplier = self.schedule.size_multiplier(ctx.drawdown_pct);

        if multiplier.is_zero() {
            if self.config.early_drawdown_cutoff {
                return Ok(ctx.reject(
                    Self::NAME,
                    &proposal,
                    format!(
                        "drawdown {:.2}% reached the {:.2}% ceiling",
                        ctx.drawdown_pct * Decimal::ONE_HUNDRED,
                        self.schedule.max_drawdown_pct() * Decimal::ONE_HUNDRED
                    ),
                ));
            }
            // Maximum Drawdown owns the hard stop.
            ctx.adjusted(Self::NAME, &proposal, "size", proposal.size, Decimal::ZERO);
            proposal.size = Some(Decimal::ZERO);
            proposal.risk_fraction = Some(Decimal::ZERO);
            return Ok(LayerVerdict::Approve(proposal));
        }

        let fraction = self.config.position_size_pct * multiplier;
        let raw_size = ctx.snapshot.available_balance * fraction;

        if raw_size < self.config.min_position_size {
            return Ok(ctx.reject(
                Self::NAME,
                &proposal,
                format!(
                    "position size {:.2} below minimum {}",
                    raw_size, self.config.min_position_size
                ),
            ));
        }

        let size = raw_size.min(self.config.max_position_size);
        debug!(
            symbol = %proposal.symbol,
            %size,
            %fraction,
            "PositionSizing: sized from available balance"
        );

        // The cap lowers the fraction actually committed.
        let effective_fraction = if size < raw_size {
            size / ctx.snapshot.available_balance
        } else {
            fraction
        };

        ctx.adjusted(Self::NAME, &proposal, "size", proposal.size, size);
        proposal.size = Some(size);
        proposal.risk_fraction = Some(effective_fraction);
        Ok(LayerVerdict::Approve(proposal))
    }
}

use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;

use super::layer_trait::{EvaluationContext, LayerVerdict, RiskLayer};
use crate::domain::errors::RiskError;
use crate::domain::risk::drawdown::DrawdownSchedule;
use crate::domain::risk::risk_config::LeverageConfig;
use crate::domain::trading::types::TradeProposal;

/// Substitutes the approved leverage: confidence-scaled, capped by the
/// request and by the drawdown-reduced maximum, floored to a whole multiple.
pub struct LeverageControlLayer {
    config: LeverageConfig,
    schedule: DrawdownSchedule,
}

impl LeverageControlLayer {
    pub const NAME: &'static str = "LeverageControl";

    pub fn new(config: LeverageConfig, schedule: DrawdownSchedule) -> Self {
        Self { config, schedule }
    }

    fn approved_leverage(
        &self,
        requested: Decimal,
        confidence: Decimal,
        drawdown_pct: Decimal,
    ) -> Decimal {
        let base = confidence * self.config.max_leverage;
        let ceiling = self.config.max_leverage * self.schedule.leverage_multiplier(drawdown_pct);
        let allowed = requested.min(ceiling);
        base.min(allowed).floor()
    }
}

impl RiskLayer for LeverageControlLayer {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn evaluate(
        &mut self,
        mut proposal: TradeProposal,
        ctx: &EvaluationContext<'_>,
    ) -> Result<LayerVerdict, RiskError> {
        let confidence = Decimal::from_f64(proposal.confidence).ok_or_else(|| {
            RiskError::layer_fault(
                Self::NAME,
                format!("confidence {} is not representable", proposal.confidence),
            )
        })?;

        let leverage = self.approved_leverage(proposal.leverage, confidence, ctx.drawdown_pct);
        if leverage < self.config.min_leverage {
            return Ok(ctx.reject(
                Self::NAME,
                &proposal,
                format!(
                    "leverage {}x below minimum {}x (confidence {:.2}, drawdown {:.2}%)",
                    leverage,
                    self.config.min_leverage,
                    proposal.confidence,
                    ctx.drawdown_pct * Decimal::ONE_HUNDRED
                ),
            ));
        }

        ctx.adjusted(
            Self::NAME,
            &proposal,
            "leverage",
            Some(proposal.leverage),
            leverage,
        );
        proposal.leverage = leverage;
        Ok(LayerVerdict::Approve(proposal))
    }
}

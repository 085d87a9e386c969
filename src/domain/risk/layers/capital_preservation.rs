use rust_decimal::Decimal;

use super::layer_trait::{EvaluationContext, LayerVerdict, RiskLayer};
use crate::domain::errors::RiskError;
use crate::domain::risk::risk_config::CapitalPreservationConfig;
use crate::domain::trading::types::TradeProposal;

/// Final floor: nothing trades once the balance falls under a fraction of
/// initial capital.
pub struct CapitalPreservationLayer {
    config: CapitalPreservationConfig,
    initial_capital: Decimal,
}

impl CapitalPreservationLayer {
    pub const NAME: &'static str = "CapitalPreservation";

    pub fn new(config: CapitalPreservationConfig, initial_capital: Decimal) -> Self {
        Self {
            config,
            initial_capital,
        }
    }

    pub fn floor(&self) -> Decimal {
        self.initial_capital * self.config.capital_floor_pct
    }
}

impl RiskLayer for CapitalPreservationLayer {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn evaluate(
        &mut self,
        proposal: TradeProposal,
        ctx: &EvaluationContext<'_>,
    ) -> Result<LayerVerdict, RiskError> {
        let floor = self.floor();
        if ctx.snapshot.total_balance < floor {
            return Ok(ctx.reject(
                Self::NAME,
                &proposal,
                format!(
                    "balance {} below capital floor {} ({}% of {})",
                    ctx.snapshot.total_balance,
                    floor,
                    self.config.capital_floor_pct * Decimal::ONE_HUNDRED,
                    self.initial_capital
                ),
            ));
        }
        Ok(LayerVerdict::Approve(proposal))
    }
}

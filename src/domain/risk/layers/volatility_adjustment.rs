use rust_decimal::Decimal;
use tracing::debug;

use super::layer_trait::{EvaluationContext, LayerVerdict, RiskLayer};
use crate::domain::errors::RiskError;
use crate::domain::risk::risk_config::VolatilityConfig;
use crate::domain::trading::types::{TradeProposal, TradeSide};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolatilityRegime {
    Normal,
    High,
    Extreme,
}

/// Shrinks size and widens the stop when recent realized volatility runs
/// hot against its baseline. Never rejects.
pub struct VolatilityAdjustmentLayer {
    config: VolatilityConfig,
    /// Cap on the widened stop distance, as a fraction of entry.
    max_stop_distance_pct: Decimal,
}

impl VolatilityAdjustmentLayer {
    pub const NAME: &'static str = "VolatilityAdjustment";

    pub fn new(config: VolatilityConfig, max_stop_distance_pct: Decimal) -> Self {
        Self {
            config,
            max_stop_distance_pct,
        }
    }

    pub fn regime(&self, ratio: f64) -> VolatilityRegime {
        if ratio > self.config.extreme_ratio {
            VolatilityRegime::Extreme
        } else if ratio > self.config.high_ratio {
            VolatilityRegime::High
        } else {
            VolatilityRegime::Normal
        }
    }

    /// Stop moved away from entry by `1 / factor`, capped at the maximum distance.
    fn widened_stop(
        &self,
        side: TradeSide,
        entry: Decimal,
        stop: Decimal,
        factor: Decimal,
    ) -> Decimal {
        let distance = (entry - stop).abs();
        let cap = entry * self.max_stop_distance_pct;
        let widened = (distance / factor).min(cap).max(distance);
        match side {
            TradeSide::Long => entry - widened,
            TradeSide::Short => entry + widened,
        }
    }
}

impl RiskLayer for VolatilityAdjustmentLayer {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn evaluate(
        &mut self,
        mut proposal: TradeProposal,
        ctx: &EvaluationContext<'_>,
    ) -> Result<LayerVerdict, RiskError> {
        let Some(series) = ctx.market.volatility.as_ref() else {
            return Ok(LayerVerdict::Approve(proposal));
        };
        if series.has_non_finite() {
            return Err(RiskError::layer_fault(
                Self::NAME,
                "volatility series contains a non-finite return",
            ));
        }

        let Some(ratio) =
            series.volatility_ratio(self.config.recent_periods, self.config.lookback_periods)
        else {
            debug!(
                symbol = %proposal.symbol,
                samples = series.len(),
                "VolatilityAdjustment: not enough history, passing through"
            );
            return Ok(LayerVerdict::Approve(proposal));
        };

        let factor = match self.regime(ratio) {
            VolatilityRegime::Normal => return Ok(LayerVerdict::Approve(proposal)),
            VolatilityRegime::High => self.config.high_size_factor,
            VolatilityRegime::Extreme => self.config.extreme_size_factor,
        };

        if let Some(size) = proposal.size {
            let reduced = size * factor;
            ctx.adjusted(Self::NAME, &proposal, "size", Some(size), reduced);
            proposal.size = Some(reduced);
        }

        if let Some(stop) = proposal.stop_price {
            let widened = self.widened_stop(proposal.side, proposal.entry_price, stop, factor);
            ctx.adjusted(Self::NAME, &proposal, "stop_price", Some(stop), widened);
            proposal.stop_price = Some(widened);
        }

        Ok(LayerVerdict::Approve(proposal))
    }
}

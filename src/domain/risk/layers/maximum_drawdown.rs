use rust_decimal::Decimal;

use super::layer_trait::{EvaluationContext, LayerVerdict, RiskLayer};
use crate::domain::errors::RiskError;
use crate::domain::risk::events::{RiskEvent, RiskObserver};
use crate::domain::risk::risk_config::DrawdownConfig;
use crate::domain::risk::state::DrawdownState;
use crate::domain::trading::account::AccountSnapshot;
use crate::domain::trading::types::{TradeProposal, TradeResult};

/// Hard drawdown gate and the single owner of the account's peak balance.
///
/// Other layers get the drawdown figure through the evaluation context,
/// which `RiskManager` fills from [`MaximumDrawdownLayer::drawdown_for`].
pub struct MaximumDrawdownLayer {
    config: DrawdownConfig,
    state: DrawdownState,
}

impl MaximumDrawdownLayer {
    pub const NAME: &'static str = "MaximumDrawdown";

    pub fn new(config: DrawdownConfig, initial_capital: Decimal) -> Self {
        Self::with_state(config, DrawdownState::new(initial_capital))
    }

    pub fn with_state(config: DrawdownConfig, state: DrawdownState) -> Self {
        Self { config, state }
    }

    pub fn state(&self) -> &DrawdownState {
        &self.state
    }

    pub fn peak_balance(&self) -> Decimal {
        self.state.peak_balance
    }

    /// Stored peak, raised to any higher mark the snapshot reports.
    /// Read-only: the stored peak moves only through `update_balance`.
    pub fn effective_peak(&self, snapshot: &AccountSnapshot) -> Decimal {
        self.state
            .peak_balance
            .max(snapshot.peak_balance)
            .max(snapshot.total_balance)
    }

    pub fn drawdown_for(&self, snapshot: &AccountSnapshot) -> Decimal {
        DrawdownState::drawdown_against(self.effective_peak(snapshot), snapshot.total_balance)
    }

    pub fn update_balance(&mut self, observed: Decimal, observer: &dyn RiskObserver) {
        if self.state.observe(observed) {
            observer.on_event(&RiskEvent::PeakUpdated {
                peak: self.state.peak_balance,
            });
        }
    }
}

impl RiskLayer for MaximumDrawdownLayer {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn evaluate(
        &mut self,
        proposal: TradeProposal,
        ctx: &EvaluationContext<'_>,
    ) -> Result<LayerVerdict, RiskError> {
        let peak = self.effective_peak(ctx.snapshot);
        let drawdown = DrawdownState::drawdown_against(peak, ctx.snapshot.total_balance);

        if drawdown >= self.config.max_drawdown_pct {
            return Ok(ctx.reject(
                Self::NAME,
                &proposal,
                format!(
                    "drawdown {:.2}% from peak {} reached the {:.2}% limit",
                    (drawdown * Decimal::ONE_HUNDRED).round_dp(2),
                    peak,
                    self.config.max_drawdown_pct * Decimal::ONE_HUNDRED
                ),
            ));
        }

        Ok(LayerVerdict::Approve(proposal))
    }

    fn record_result(&mut self, result: &TradeResult, observer: &dyn RiskObserver) {
        if let Some(balance) = result.balance_after {
            self.update_balance(balance, observer);
        }
    }
}

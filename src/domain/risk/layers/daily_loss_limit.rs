use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::debug;

use super::layer_trait::{EvaluationContext, LayerVerdict, RiskLayer};
use crate::domain::errors::RiskError;
use crate::domain::risk::events::{RiskEvent, RiskObserver};
use crate::domain::risk::risk_config::{DailyLossConfig, RiskConfigError};
use crate::domain::risk::state::DailyLossState;
use crate::domain::trading::types::{TradeProposal, TradeResult};

/// Blocks trading for the rest of the day once realized losses reach
/// `max_daily_loss_pct` of initial capital.
///
/// The trading day is the calendar date in a fixed UTC offset. Only
/// `record_result` adds to the daily P&L.
pub struct DailyLossLimitLayer {
    config: DailyLossConfig,
    initial_capital: Decimal,
    offset: FixedOffset,
    state: DailyLossState,
}

impl DailyLossLimitLayer {
    pub const NAME: &'static str = "DailyLossLimit";

    pub fn new(config: DailyLossConfig, initial_capital: Decimal) -> Result<Self, RiskConfigError> {
        Self::with_state(config, initial_capital, DailyLossState::default())
    }

    pub fn with_state(
        config: DailyLossConfig,
        initial_capital: Decimal,
        state: DailyLossState,
    ) -> Result<Self, RiskConfigError> {
        let offset = FixedOffset::east_opt(config.utc_offset_minutes * 60).ok_or_else(|| {
            RiskConfigError::InvalidThreshold {
                field: "utc_offset_minutes",
                value: config.utc_offset_minutes.to_string(),
                expected: "strictly within one day of UTC",
            }
        })?;
        Ok(Self {
            config,
            initial_capital,
            offset,
            state,
        })
    }

    pub fn state(&self) -> &DailyLossState {
        &self.state
    }

    pub fn daily_pnl(&self) -> Decimal {
        self.state.daily_pnl
    }

    /// Loss amount (positive) at which trading stops for the day.
    pub fn loss_limit(&self) -> Decimal {
        self.config.max_daily_loss_pct * self.initial_capital
    }

    pub fn trading_day(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.offset).date_naive()
    }

    fn roll(&mut self, at: DateTime<Utc>, observer: &dyn RiskObserver) {
        let date = self.trading_day(at);
        let previous_pnl = self.state.daily_pnl;
        if self.state.roll_to(date) {
            observer.on_event(&RiskEvent::DailyReset { date, previous_pnl });
        }
    }
}

impl RiskLayer for DailyLossLimitLayer {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn evaluate(
        &mut self,
        proposal: TradeProposal,
        ctx: &EvaluationContext<'_>,
    ) -> Result<LayerVerdict, RiskError> {
        self.roll(ctx.now, ctx.observer());

        let limit = self.loss_limit();
        if self.state.daily_pnl <= -limit {
            return Ok(ctx.reject(
                Self::NAME,
                &proposal,
                format!(
                    "daily P&L {} reached the loss limit of -{} ({}% of {})",
                    self.state.daily_pnl,
                    limit,
                    self.config.max_daily_loss_pct * Decimal::ONE_HUNDRED,
                    self.initial_capital
                ),
            ));
        }

        Ok(LayerVerdict::Approve(proposal))
    }

    fn record_result(&mut self, result: &TradeResult, observer: &dyn RiskObserver) {
        self.roll(result.closed_at, observer);

        if let Some(current) = self.state.current_date
            && self.trading_day(result.closed_at) < current
        {
            debug!(
                symbol = %result.symbol,
                closed_at = %result.closed_at,
                "DailyLossLimit: result from a previous trading day ignored"
            );
            return;
        }

        self.state.daily_pnl += result.realized_pnl;
    }
}

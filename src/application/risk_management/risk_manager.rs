use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;

use crate::domain::errors::RiskError;
use crate::domain::market::MarketConditions;
use crate::domain::risk::drawdown::DrawdownSchedule;
use crate::domain::risk::events::{RiskEvent, RiskObserver};
use crate::domain::risk::layers::{
    CapitalPreservationLayer, CircuitBreakerLayer, CorrelationRiskLayer, DailyLossLimitLayer,
    EvaluationContext, LayerVerdict, LeverageControlLayer, LiquidityCheckLayer,
    MaximumDrawdownLayer, PositionSizingLayer, RateLimitLayer, RiskLayer, StopLossLayer,
    VolatilityAdjustmentLayer,
};
use crate::domain::risk::risk_config::RiskConfig;
use crate::domain::risk::state::{DrawdownState, RiskState};
use crate::domain::trading::account::AccountSnapshot;
use crate::domain::trading::types::{CriticalFailureSignal, TradeProposal, TradeResult};

const LAYER_COUNT: usize = 11;

/// Final decision for one proposal.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum EvaluationVerdict {
    /// Every layer passed; the proposal carries their adjustments.
    Approved(TradeProposal),
    Rejected { layer: &'static str, reason: String },
}

impl EvaluationVerdict {
    pub fn is_approved(&self) -> bool {
        matches!(self, EvaluationVerdict::Approved(_))
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, EvaluationVerdict::Rejected { .. })
    }

    pub fn proposal(&self) -> Option<&TradeProposal> {
        match self {
            EvaluationVerdict::Approved(proposal) => Some(proposal),
            EvaluationVerdict::Rejected { .. } => None,
        }
    }

    pub fn rejecting_layer(&self) -> Option<&'static str> {
        match self {
            EvaluationVerdict::Rejected { layer, .. } => Some(layer),
            EvaluationVerdict::Approved(_) => None,
        }
    }

    pub fn rejection_reason(&self) -> Option<&str> {
        match self {
            EvaluationVerdict::Rejected { reason, .. } => Some(reason),
            EvaluationVerdict::Approved(_) => None,
        }
    }
}

/// Dashboard view of the pipeline's state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskStatus {
    pub as_of: DateTime<Utc>,
    pub halted: bool,
    pub halt_reason: Option<String>,
    /// `None` while active or when the halt needs a manual clear.
    pub halt_remaining_seconds: Option<i64>,
    pub consecutive_losses: u32,
    pub daily_pnl: Decimal,
    pub trading_day: Option<NaiveDate>,
    pub peak_balance: Decimal,
    pub approvals_in_window: usize,
}

/// The ordered risk pipeline for one account.
///
/// Layers run in a fixed order and the first rejection short-circuits the
/// rest. The manager never logs; layers and the final approval report
/// through the injected observer. It is not synchronized: run one manager
/// per account behind a single owner (see `RiskService`).
pub struct RiskManager {
    config: RiskConfig,
    observer: Arc<dyn RiskObserver>,
    position_sizing: PositionSizingLayer,
    leverage_control: LeverageControlLayer,
    stop_loss: StopLossLayer,
    daily_loss: DailyLossLimitLayer,
    max_drawdown: MaximumDrawdownLayer,
    correlation: CorrelationRiskLayer,
    volatility: VolatilityAdjustmentLayer,
    liquidity: LiquidityCheckLayer,
    rate_limit: RateLimitLayer,
    circuit_breaker: CircuitBreakerLayer,
    capital_preservation: CapitalPreservationLayer,
}

impl RiskManager {
    /// Fails fast on an invalid configuration.
    pub fn new(config: RiskConfig, observer: Arc<dyn RiskObserver>) -> Result<Self, RiskError> {
        let state = RiskState {
            circuit_breaker: Default::default(),
            daily_loss: Default::default(),
            drawdown: DrawdownState::new(config.initial_capital),
            recent_approvals: Vec::new(),
        };
        Self::restore(config, observer, state)
    }

    /// Rebuilds a manager from previously exported state.
    pub fn restore(
        config: RiskConfig,
        observer: Arc<dyn RiskObserver>,
        state: RiskState,
    ) -> Result<Self, RiskError> {
        config.validate()?;
        let schedule = DrawdownSchedule::new(config.drawdown.max_drawdown_pct);

        Ok(Self {
            position_sizing: PositionSizingLayer::new(config.position_sizing.clone(), schedule),
            leverage_control: LeverageControlLayer::new(config.leverage.clone(), schedule),
            stop_loss: StopLossLayer::new(config.stop_loss.clone()),
            daily_loss: DailyLossLimitLayer::with_state(
                config.daily_loss.clone(),
                config.initial_capital,
                state.daily_loss,
            )?,
            max_drawdown: MaximumDrawdownLayer::with_state(config.drawdown.clone(), state.drawdown),
            correlation: CorrelationRiskLayer::new(config.correlation.clone()),
            volatility: VolatilityAdjustmentLayer::new(
                config.volatility.clone(),
                config.stop_loss.max_stop_distance_pct,
            ),
            liquidity: LiquidityCheckLayer::new(config.liquidity.clone()),
            rate_limit: RateLimitLayer::with_history(
                config.rate_limit.clone(),
                state.recent_approvals,
            ),
            circuit_breaker: CircuitBreakerLayer::with_state(
                config.circuit_breaker.clone(),
                state.circuit_breaker,
            ),
            capital_preservation: CapitalPreservationLayer::new(
                config.capital_preservation.clone(),
                config.initial_capital,
            ),
            config,
            observer,
        })
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    pub fn observer(&self) -> &Arc<dyn RiskObserver> {
        &self.observer
    }

    fn layers(&self) -> [&dyn RiskLayer; LAYER_COUNT] {
        [
            &self.position_sizing,
            &self.leverage_control,
            &self.stop_loss,
            &self.daily_loss,
            &self.max_drawdown,
            &self.correlation,
            &self.volatility,
            &self.liquidity,
            &self.rate_limit,
            &self.circuit_breaker,
            &self.capital_preservation,
        ]
    }

    fn layers_mut(&mut self) -> [&mut dyn RiskLayer; LAYER_COUNT] {
        [
            &mut self.position_sizing,
            &mut self.leverage_control,
            &mut self.stop_loss,
            &mut self.daily_loss,
            &mut self.max_drawdown,
            &mut self.correlation,
            &mut self.volatility,
            &mut self.liquidity,
            &mut self.rate_limit,
            &mut self.circuit_breaker,
            &mut self.capital_preservation,
        ]
    }

    /// Names of the layers that will run, in order.
    pub fn active_layers(&self) -> Vec<&'static str> {
        self.layers()
            .into_iter()
            .filter(|layer| layer.is_enabled())
            .map(|layer| layer.name())
            .collect()
    }

    pub fn evaluate(
        &mut self,
        proposal: TradeProposal,
        snapshot: &AccountSnapshot,
    ) -> Result<EvaluationVerdict, RiskError> {
        self.evaluate_with_market(proposal, snapshot, &MarketConditions::default())
    }

    /// Runs the proposal through every enabled layer in order.
    ///
    /// `Ok(Rejected)` is a policy decision. `Err` means no decision could be
    /// reached and the trade must be treated as blocked.
    pub fn evaluate_with_market(
        &mut self,
        proposal: TradeProposal,
        snapshot: &AccountSnapshot,
        market: &MarketConditions,
    ) -> Result<EvaluationVerdict, RiskError> {
        proposal.validate()?;
        snapshot.validate()?;

        let drawdown_pct = self.max_drawdown.drawdown_for(snapshot);
        let observer = Arc::clone(&self.observer);
        let ctx = EvaluationContext::new(snapshot, market, drawdown_pct, observer.as_ref());

        // An expired halt is lifted even when an earlier layer rejects.
        if self.circuit_breaker.is_enabled() {
            self.circuit_breaker.refresh(ctx.now, ctx.observer());
        }

        // While halted, every verdict carries the breaker's countdown.
        if self.circuit_breaker.is_enabled() && self.circuit_breaker.is_halted_at(ctx.now) {
            let verdict = self.circuit_breaker.evaluate(proposal, &ctx)?;
            return Ok(match verdict {
                LayerVerdict::Reject(reason) => EvaluationVerdict::Rejected {
                    layer: CircuitBreakerLayer::NAME,
                    reason,
                },
                LayerVerdict::Approve(_) => {
                    return Err(RiskError::layer_fault(
                        CircuitBreakerLayer::NAME,
                        "halted breaker approved a proposal",
                    ));
                }
            });
        }

        let mut current = proposal;
        for layer in self.layers_mut() {
            if !layer.is_enabled() {
                continue;
            }
            match layer.evaluate(current, &ctx)? {
                LayerVerdict::Approve(next) => current = next,
                LayerVerdict::Reject(reason) => {
                    return Ok(EvaluationVerdict::Rejected {
                        layer: layer.name(),
                        reason,
                    });
                }
            }
        }

        ctx.emit(RiskEvent::Approved {
            symbol: current.symbol.clone(),
            size: current.size,
            leverage: current.leverage,
            stop_price: current.stop_price,
        });
        Ok(EvaluationVerdict::Approved(current))
    }

    /// Feeds a closed trade to every layer that keeps result state.
    pub fn record_result(&mut self, result: &TradeResult) {
        let observer = Arc::clone(&self.observer);
        for layer in self.layers_mut() {
            layer.record_result(result, observer.as_ref());
        }
    }

    /// Counts an approval the execution engine acted on toward the rate limit.
    pub fn record_approval(&mut self, at: DateTime<Utc>) {
        self.rate_limit.record_approval(at);
    }

    pub fn record_critical_failure(&mut self, signal: &CriticalFailureSignal) {
        self.circuit_breaker
            .record_critical_failure(signal, self.observer.as_ref());
    }

    /// Operator clear of a circuit breaker halt.
    pub fn clear_halt(&mut self, now: DateTime<Utc>) -> bool {
        self.circuit_breaker.clear_halt(now, self.observer.as_ref())
    }

    /// Reports an observed balance; only ever raises the peak.
    pub fn update_balance(&mut self, observed: Decimal) {
        self.max_drawdown
            .update_balance(observed, self.observer.as_ref());
    }

    pub fn is_halted(&self) -> bool {
        self.is_halted_at(Utc::now())
    }

    pub fn is_halted_at(&self, now: DateTime<Utc>) -> bool {
        self.circuit_breaker.is_halted_at(now)
    }

    pub fn halt_remaining(&self, now: DateTime<Utc>) -> Option<chrono::Duration> {
        self.circuit_breaker.halt_remaining(now)
    }

    pub fn peak_balance(&self) -> Decimal {
        self.max_drawdown.peak_balance()
    }

    pub fn daily_pnl(&self) -> Decimal {
        self.daily_loss.daily_pnl()
    }

    pub fn consecutive_losses(&self) -> u32 {
        self.circuit_breaker.consecutive_losses()
    }

    pub fn export_state(&self) -> RiskState {
        RiskState {
            circuit_breaker: self.circuit_breaker.state().clone(),
            daily_loss: self.daily_loss.state().clone(),
            drawdown: self.max_drawdown.state().clone(),
            recent_approvals: self.rate_limit.recent_approvals(),
        }
    }

    pub fn status(&self, now: DateTime<Utc>) -> RiskStatus {
        let halt = self.circuit_breaker.halt_at(now);
        RiskStatus {
            as_of: now,
            halted: halt.is_some(),
            halt_reason: halt.map(|halt| halt.reason.to_string()),
            halt_remaining_seconds: halt
                .and_then(|halt| halt.remaining(now))
                .map(|remaining| remaining.num_seconds()),
            consecutive_losses: self.consecutive_losses(),
            daily_pnl: self.daily_pnl(),
            trading_day: self.daily_loss.state().current_date,
            peak_balance: self.peak_balance(),
            approvals_in_window: self.rate_limit.approvals_in_window(now),
        }
    }
}

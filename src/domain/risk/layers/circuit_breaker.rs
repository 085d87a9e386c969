use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use tracing::debug;

use super::layer_trait::{EvaluationContext, LayerVerdict, RiskLayer};
use crate::domain::errors::RiskError;
use crate::domain::market::MarketConditions;
use crate::domain::risk::events::{RiskEvent, RiskObserver};
use crate::domain::risk::risk_config::CircuitBreakerConfig;
use crate::domain::risk::state::{CircuitBreakerState, Halt, HaltReason};
use crate::domain::trading::types::{CriticalFailureSignal, TradeProposal, TradeResult};

/// Formats a halt countdown as `47h 59m 59s`.
pub fn format_remaining(remaining: Duration) -> String {
    let total = remaining.num_seconds().max(0);
    format!(
        "{}h {}m {}s",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}

/// Emergency stop for the whole account.
///
/// `Active` until consecutive losses reach the threshold, a flash crash is
/// seen or a critical failure is reported; then `Halted` until the halt
/// window passes (auto-resume, loss counter reset) or an operator clears it.
/// A zero halt duration never expires on its own.
pub struct CircuitBreakerLayer {
    config: CircuitBreakerConfig,
    state: CircuitBreakerState,
}

impl CircuitBreakerLayer {
    pub const NAME: &'static str = "CircuitBreaker";

    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self::with_state(config, CircuitBreakerState::default())
    }

    pub fn with_state(config: CircuitBreakerConfig, state: CircuitBreakerState) -> Self {
        Self { config, state }
    }

    pub fn state(&self) -> &CircuitBreakerState {
        &self.state
    }

    pub fn consecutive_losses(&self) -> u32 {
        self.state.consecutive_losses
    }

    /// A halt is recorded, expired or not. Use `is_halted_at` for the
    /// state at a given instant.
    pub fn is_halted(&self) -> bool {
        self.state.is_halted()
    }

    pub fn is_halted_at(&self, now: DateTime<Utc>) -> bool {
        self.halt_at(now).is_some()
    }

    /// The halt in force at `now`, if any.
    pub fn halt_at(&self, now: DateTime<Utc>) -> Option<&Halt> {
        self.state.halt.as_ref().filter(|halt| halt.is_active_at(now))
    }

    /// Remaining halt time at `now`. `None` when not halted or when the
    /// halt is indefinite; check `is_halted_at` to tell them apart.
    pub fn halt_remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.halt_at(now).and_then(|halt| halt.remaining(now))
    }

    pub fn record_critical_failure(
        &mut self,
        signal: &CriticalFailureSignal,
        observer: &dyn RiskObserver,
    ) {
        self.trigger_halt(
            HaltReason::CriticalFailure {
                reason: signal.reason.clone(),
            },
            signal.at,
            observer,
        );
    }

    /// Operator action. Returns whether a halt was actually lifted.
    pub fn clear_halt(&mut self, now: DateTime<Utc>, observer: &dyn RiskObserver) -> bool {
        if self.state.halt.take().is_none() {
            return false;
        }
        self.state.consecutive_losses = 0;
        observer.on_event(&RiskEvent::Resumed {
            at: now,
            manual: true,
        });
        true
    }

    fn trigger_halt(&mut self, reason: HaltReason, at: DateTime<Utc>, observer: &dyn RiskObserver) {
        if !self.config.enabled {
            debug!(%reason, "CircuitBreaker: disabled, halt not applied");
            return;
        }
        let halt = Halt::new(reason, at, self.config.halt_duration());
        observer.on_event(&RiskEvent::Halted {
            reason: halt.reason.clone(),
            since: halt.since,
            window: halt.window,
        });
        self.state.halt = Some(halt);
    }

    /// Lifts a timed halt whose window has passed and resets the loss
    /// counter. Returns whether a halt was lifted.
    pub fn refresh(&mut self, now: DateTime<Utc>, observer: &dyn RiskObserver) -> bool {
        let expired = self
            .state
            .halt
            .as_ref()
            .is_some_and(|halt| !halt.is_active_at(now));
        if expired {
            self.state.halt = None;
            self.state.consecutive_losses = 0;
            observer.on_event(&RiskEvent::Resumed {
                at: now,
                manual: false,
            });
        }
        expired
    }

    /// Largest drop seen either between entry and the current price or
    /// from the peak of the recent price window to its last print.
    fn flash_crash_drop(
        &self,
        proposal: &TradeProposal,
        market: &MarketConditions,
    ) -> Option<Decimal> {
        let from_entry = proposal
            .current_price
            .filter(|price| *price > Decimal::ZERO)
            .map(|current| (proposal.entry_price - current) / proposal.entry_price);

        let from_window = match (
            market.recent_prices.iter().copied().filter(|p| *p > Decimal::ZERO).max(),
            market.recent_prices.last().copied(),
        ) {
            (Some(peak), Some(last)) if last > Decimal::ZERO => Some((peak - last) / peak),
            _ => None,
        };

        from_entry
            .into_iter()
            .chain(from_window)
            .filter(|drop| *drop >= self.config.flash_crash_threshold_pct)
            .max()
    }

    fn halted_reason(halt: &Halt, now: DateTime<Utc>) -> String {
        match halt.remaining(now) {
            Some(remaining) => format!(
                "trading halted: {}; resumes in {}",
                halt.reason,
                format_remaining(remaining)
            ),
            None => format!("trading halted: {}; requires manual clear", halt.reason),
        }
    }
}

impl RiskLayer for CircuitBreakerLayer {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn evaluate(
        &mut self,
        proposal: TradeProposal,
        ctx: &EvaluationContext<'_>,
    ) -> Result<LayerVerdict, RiskError> {
        self.refresh(ctx.now, ctx.observer());

        if self.state.halt.is_none()
            && let Some(drop_pct) = self.flash_crash_drop(&proposal, ctx.market)
        {
            self.trigger_halt(
                HaltReason::FlashCrash {
                    symbol: proposal.symbol.clone(),
                    drop_pct,
                },
                ctx.now,
                ctx.observer(),
            );
        }

        if let Some(halt) = self.state.halt.as_ref() {
            let reason = Self::halted_reason(halt, ctx.now);
            return Ok(ctx.reject(Self::NAME, &proposal, reason));
        }

        Ok(LayerVerdict::Approve(proposal))
    }

    fn record_result(&mut self, result: &TradeResult, observer: &dyn RiskObserver) {
        self.refresh(result.closed_at, observer);
        self.state.last_trade_time = Some(result.closed_at);
        self.state.trading_day_seed = Some(result.closed_at.date_naive());

        if result.is_win {
            self.state.consecutive_losses = 0;
            return;
        }

        self.state.consecutive_losses = self.state.consecutive_losses.saturating_add(1);
        let count = self.state.consecutive_losses;
        if count >= self.config.consecutive_losses_threshold
            && !self.is_halted_at(result.closed_at)
        {
            self.trigger_halt(
                HaltReason::ConsecutiveLosses { count },
                result.closed_at,
                observer,
            );
        }
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled
    }
}

use chrono::{DateTime, Utc};
use std::collections::VecDeque;

use super::layer_trait::{EvaluationContext, LayerVerdict, RiskLayer};
use crate::domain::errors::RiskError;
use crate::domain::risk::risk_config::RateLimitConfig;
use crate::domain::trading::types::TradeProposal;

/// Caps approvals inside a trailing time window.
///
/// Approvals are recorded by the execution engine through
/// `RiskManager::record_approval` once it acts on a verdict; evaluation
/// only counts.
pub struct RateLimitLayer {
    config: RateLimitConfig,
    /// Oldest first, at most `max_trades_per_window` entries.
    approvals: VecDeque<DateTime<Utc>>,
}

impl RateLimitLayer {
    pub const NAME: &'static str = "RateLimit";

    pub fn new(config: RateLimitConfig) -> Self {
        Self::with_history(config, Vec::new())
    }

    pub fn with_history(config: RateLimitConfig, history: Vec<DateTime<Utc>>) -> Self {
        let mut layer = Self {
            config,
            approvals: VecDeque::new(),
        };
        for at in history {
            layer.record_approval(at);
        }
        layer
    }

    pub fn approvals_in_window(&self, now: DateTime<Utc>) -> usize {
        let window_start = now - self.config.window();
        self.approvals
            .iter()
            .filter(|at| **at > window_start && **at <= now)
            .count()
    }

    pub fn recent_approvals(&self) -> Vec<DateTime<Utc>> {
        self.approvals.iter().copied().collect()
    }

    pub fn record_approval(&mut self, at: DateTime<Utc>) {
        let position = self.approvals.partition_point(|existing| *existing <= at);
        self.approvals.insert(position, at);

        if let Some(newest) = self.approvals.back().copied() {
            let window_start = newest - self.config.window();
            while self
                .approvals
                .front()
                .is_some_and(|oldest| *oldest <= window_start)
            {
                self.approvals.pop_front();
            }
        }
        while self.approvals.len() > self.config.max_trades_per_window {
            self.approvals.pop_front();
        }
    }
}

impl RiskLayer for RateLimitLayer {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn evaluate(
        &mut self,
        proposal: TradeProposal,
        ctx: &EvaluationContext<'_>,
    ) -> Result<LayerVerdict, RiskError> {
        let count = self.approvals_in_window(ctx.now);
        if count >= self.config.max_trades_per_window {
            return Ok(ctx.reject(
                Self::NAME,
                &proposal,
                format!(
                    "{} trades approved in the last {}s, limit is {}",
                    count, self.config.window_seconds, self.config.max_trades_per_window
                ),
            ));
        }
        Ok(LayerVerdict::Approve(proposal))
    }
}

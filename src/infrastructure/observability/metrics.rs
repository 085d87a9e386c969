//! Prometheus metrics for the risk gate
//!
//! All metrics use the `riskgate_` prefix and are fed by observing risk events.

use prometheus::{
    Gauge, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use rust_decimal::prelude::ToPrimitive;
use std::sync::Arc;
use std::time::Instant;

use crate::domain::risk::events::{RiskEvent, RiskObserver};
use crate::domain::risk::state::HaltReason;

/// Prometheus metrics for one account's risk pipeline
#[derive(Clone)]
pub struct RiskMetrics {
    registry: Arc<Registry>,
    /// Rejections by layer
    pub rejections_total: IntCounterVec,
    /// Field rewrites by layer and field
    pub adjustments_total: IntCounterVec,
    pub approvals_total: IntCounter,
    /// Halts by trigger
    pub halts_total: IntCounterVec,
    /// Circuit breaker status (0=active, 1=halted)
    pub circuit_breaker_status: Gauge,
    pub peak_balance: Gauge,
    pub daily_resets_total: IntCounter,
    /// Wall time of one `RiskManager::evaluate`
    pub evaluation_latency_seconds: Histogram,
}

impl RiskMetrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let rejections_total = IntCounterVec::new(
            Opts::new("riskgate_rejections_total", "Rejected proposals by layer"),
            &["layer"],
        )?;
        registry.register(Box::new(rejections_total.clone()))?;

        let adjustments_total = IntCounterVec::new(
            Opts::new(
                "riskgate_adjustments_total",
                "Proposal fields rewritten by layer",
            ),
            &["layer", "field"],
        )?;
        registry.register(Box::new(adjustments_total.clone()))?;

        let approvals_total = IntCounter::with_opts(Opts::new(
            "riskgate_approvals_total",
            "Proposals approved by every layer",
        ))?;
        registry.register(Box::new(approvals_total.clone()))?;

        let halts_total = IntCounterVec::new(
            Opts::new("riskgate_halts_total", "Circuit breaker halts by trigger"),
            &["trigger"],
        )?;
        registry.register(Box::new(halts_total.clone()))?;

        let circuit_breaker_status = Gauge::with_opts(Opts::new(
            "riskgate_circuit_breaker_status",
            "Circuit breaker status (0=active, 1=halted)",
        ))?;
        registry.register(Box::new(circuit_breaker_status.clone()))?;

        let peak_balance = Gauge::with_opts(Opts::new(
            "riskgate_peak_balance",
            "Highest recorded account balance",
        ))?;
        registry.register(Box::new(peak_balance.clone()))?;

        let daily_resets_total = IntCounter::with_opts(Opts::new(
            "riskgate_daily_resets_total",
            "Daily P&L resets at the trading day boundary",
        ))?;
        registry.register(Box::new(daily_resets_total.clone()))?;

        let evaluation_latency_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "riskgate_evaluation_latency_seconds",
                "Risk pipeline evaluation latency in seconds",
            )
            .buckets(vec![0.00001, 0.00005, 0.0001, 0.0005, 0.001, 0.005, 0.01]),
        )?;
        registry.register(Box::new(evaluation_latency_seconds.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            rejections_total,
            adjustments_total,
            approvals_total,
            halts_total,
            circuit_breaker_status,
            peak_balance,
            daily_resets_total,
            evaluation_latency_seconds,
        })
    }

    /// Render all metrics in Prometheus text format
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder
            .encode_to_string(&metric_families)
            .unwrap_or_default()
    }

    /// Starts timing one evaluation; recorded when the guard drops.
    pub fn time_evaluation(&self) -> LatencyGuard {
        LatencyGuard {
            start: Instant::now(),
            histogram: self.evaluation_latency_seconds.clone(),
        }
    }
}

impl RiskObserver for RiskMetrics {
    fn on_event(&self, event: &RiskEvent) {
        match event {
            RiskEvent::Rejected { layer, .. } => {
                self.rejections_total.with_label_values(&[*layer]).inc();
            }
            RiskEvent::Adjusted { layer, field, .. } => {
                self.adjustments_total
                    .with_label_values(&[*layer, *field])
                    .inc();
            }
            RiskEvent::Approved { .. } => self.approvals_total.inc(),
            RiskEvent::Halted { reason, .. } => {
                let trigger = match reason {
                    HaltReason::ConsecutiveLosses { .. } => "consecutive_losses",
                    HaltReason::FlashCrash { .. } => "flash_crash",
                    HaltReason::CriticalFailure { .. } => "critical_failure",
                };
                self.halts_total.with_label_values(&[trigger]).inc();
                self.circuit_breaker_status.set(1.0);
            }
            RiskEvent::Resumed { .. } => self.circuit_breaker_status.set(0.0),
            RiskEvent::DailyReset { .. } => self.daily_resets_total.inc(),
            RiskEvent::PeakUpdated { peak } => {
                self.peak_balance.set(peak.to_f64().unwrap_or(0.0));
            }
        }
    }
}

/// RAII guard recording elapsed time into a histogram
pub struct LatencyGuard {
    start: Instant,
    histogram: Histogram,
}

impl Drop for LatencyGuard {
    fn drop(&mut self) {
        self.histogram.observe(self.start.elapsed().as_secs_f64());
    }
}

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::risk::state::{HaltReason, HaltWindow};

/// Structured outcome of a layer decision or state transition.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RiskEvent {
    Rejected {
        layer: &'static str,
        symbol: String,
        reason: String,
    },
    /// A layer rewrote one proposal field.
    Adjusted {
        layer: &'static str,
        symbol: String,
        field: &'static str,
        from: Option<Decimal>,
        to: Decimal,
    },
    Approved {
        symbol: String,
        size: Option<Decimal>,
        leverage: Decimal,
        stop_price: Option<Decimal>,
    },
    Halted {
        reason: HaltReason,
        since: DateTime<Utc>,
        window: HaltWindow,
    },
    Resumed {
        at: DateTime<Utc>,
        manual: bool,
    },
    DailyReset {
        date: NaiveDate,
        previous_pnl: Decimal,
    },
    PeakUpdated {
        peak: Decimal,
    },
}

impl RiskEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            RiskEvent::Rejected { .. } => "rejected",
            RiskEvent::Adjusted { .. } => "adjusted",
            RiskEvent::Approved { .. } => "approved",
            RiskEvent::Halted { .. } => "halted",
            RiskEvent::Resumed { .. } => "resumed",
            RiskEvent::DailyReset { .. } => "daily_reset",
            RiskEvent::PeakUpdated { .. } => "peak_updated",
        }
    }
}

/// Sink for risk events, injected into the manager at construction.
pub trait RiskObserver: Send + Sync {
    fn on_event(&self, event: &RiskEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl RiskObserver for NoopObserver {
    fn on_event(&self, _event: &RiskEvent) {}
}

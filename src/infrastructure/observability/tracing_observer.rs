use tracing::{debug, error, info, warn};

use crate::domain::risk::events::{RiskEvent, RiskObserver};
use crate::domain::risk::state::HaltWindow;

/// Forwards risk events to `tracing`, tagged with the account they belong to.
#[derive(Debug, Clone)]
pub struct TracingObserver {
    account: String,
}

impl TracingObserver {
    pub fn new(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
        }
    }
}

impl Default for TracingObserver {
    fn default() -> Self {
        Self::new("default")
    }
}

impl RiskObserver for TracingObserver {
    fn on_event(&self, event: &RiskEvent) {
        let account = self.account.as_str();
        match event {
            RiskEvent::Rejected {
                layer,
                symbol,
                reason,
            } => {
                warn!(account, layer, symbol = %symbol, "Trade rejected: {}", reason);
            }
            RiskEvent::Adjusted {
                layer,
                symbol,
                field,
                from,
                to,
            } => {
                debug!(account, layer, symbol = %symbol, field, ?from, %to, "Proposal adjusted");
            }
            RiskEvent::Approved {
                symbol,
                size,
                leverage,
                stop_price,
            } => {
                info!(
                    account,
                    symbol = %symbol,
                    ?size,
                    %leverage,
                    ?stop_price,
                    "Trade approved"
                );
            }
            RiskEvent::Halted {
                reason,
                since,
                window,
            } => match window {
                HaltWindow::Until(until) => {
                    error!(account, %since, %until, "CIRCUIT BREAKER ACTIVATED: {}", reason);
                }
                HaltWindow::Indefinite => {
                    error!(
                        account,
                        %since,
                        "CIRCUIT BREAKER ACTIVATED until manually cleared: {}", reason
                    );
                }
            },
            RiskEvent::Resumed { at, manual } => {
                info!(account, %at, manual, "Circuit breaker cleared, trading resumed");
            }
            RiskEvent::DailyReset { date, previous_pnl } => {
                info!(account, %date, %previous_pnl, "Daily P&L reset for new trading day");
            }
            RiskEvent::PeakUpdated { peak } => {
                debug!(account, %peak, "New peak balance");
            }
        }
    }
}

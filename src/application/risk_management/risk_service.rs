use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::application::risk_management::commands::RiskCommand;
use crate::application::risk_management::risk_manager::{
    EvaluationVerdict, RiskManager, RiskStatus,
};
use crate::domain::errors::RiskError;
use crate::domain::market::MarketConditions;
use crate::domain::risk::state::RiskState;
use crate::domain::trading::account::AccountSnapshot;
use crate::domain::trading::types::{CriticalFailureSignal, TradeProposal, TradeResult};
use crate::infrastructure::observability::RiskMetrics;

const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Owns one account's `RiskManager` and serializes every call through a
/// command queue, so concurrent proposals for the same account are evaluated
/// one at a time against consistent state.
pub struct RiskService {
    account: String,
    manager: RiskManager,
    command_rx: mpsc::Receiver<RiskCommand>,
    metrics: Option<RiskMetrics>,
}

/// Cloneable sender side of a `RiskService`.
#[derive(Clone)]
pub struct RiskServiceHandle {
    account: String,
    command_tx: mpsc::Sender<RiskCommand>,
}

impl RiskService {
    pub fn new(account: impl Into<String>, manager: RiskManager) -> (Self, RiskServiceHandle) {
        Self::with_capacity(account, manager, DEFAULT_QUEUE_CAPACITY)
    }

    pub fn with_capacity(
        account: impl Into<String>,
        manager: RiskManager,
        capacity: usize,
    ) -> (Self, RiskServiceHandle) {
        let account = account.into();
        let (command_tx, command_rx) = mpsc::channel(capacity.max(1));
        let service = Self {
            account: account.clone(),
            manager,
            command_rx,
            metrics: None,
        };
        (service, RiskServiceHandle { account, command_tx })
    }

    /// Records evaluation latency into `metrics`.
    pub fn with_metrics(mut self, metrics: RiskMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Runs the service on the current runtime.
    pub fn spawn(self) -> JoinHandle<RiskManager> {
        tokio::spawn(self.run())
    }

    /// Processes commands until every handle is dropped, then hands the
    /// manager back so its state can be persisted.
    pub async fn run(mut self) -> RiskManager {
        info!(
            account = %self.account,
            layers = ?self.manager.active_layers(),
            "RiskService started"
        );

        while let Some(command) = self.command_rx.recv().await {
            debug!(
                account = %self.account,
                command = command.name(),
                "RiskService: handling command"
            );
            self.handle(command);
        }

        info!(account = %self.account, "RiskService stopped: all handles dropped");
        self.manager
    }

    fn handle(&mut self, command: RiskCommand) {
        match command {
            RiskCommand::Evaluate {
                proposal,
                snapshot,
                market,
                reply,
            } => {
                let _timer = self.metrics.as_ref().map(RiskMetrics::time_evaluation);
                let verdict = self
                    .manager
                    .evaluate_with_market(*proposal, &snapshot, &market);
                if let Err(e) = &verdict {
                    warn!(
                        account = %self.account,
                        error = %e,
                        "RiskService: evaluation failed closed"
                    );
                }
                if reply.send(verdict).is_err() {
                    debug!(account = %self.account, "RiskService: evaluate caller went away");
                }
            }
            RiskCommand::RecordApproval { at } => self.manager.record_approval(at),
            RiskCommand::RecordResult(result) => self.manager.record_result(&result),
            RiskCommand::RecordCriticalFailure(signal) => {
                self.manager.record_critical_failure(&signal)
            }
            RiskCommand::ClearHalt { at, reply } => {
                let _ = reply.send(self.manager.clear_halt(at));
            }
            RiskCommand::UpdateBalance(balance) => self.manager.update_balance(balance),
            RiskCommand::Status { at, reply } => {
                let _ = reply.send(self.manager.status(at));
            }
            RiskCommand::ExportState { reply } => {
                let _ = reply.send(self.manager.export_state());
            }
        }
    }
}

impl RiskServiceHandle {
    pub fn account(&self) -> &str {
        &self.account
    }

    fn unavailable(&self) -> RiskError {
        RiskError::ServiceUnavailable {
            account: self.account.clone(),
        }
    }

    async fn send(&self, command: RiskCommand) -> Result<(), RiskError> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| self.unavailable())
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> RiskCommand,
    ) -> Result<T, RiskError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(build(reply_tx)).await?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    pub async fn evaluate(
        &self,
        proposal: TradeProposal,
        snapshot: AccountSnapshot,
        market: MarketConditions,
    ) -> Result<EvaluationVerdict, RiskError> {
        self.request(|reply| RiskCommand::Evaluate {
            proposal: Box::new(proposal),
            snapshot: Box::new(snapshot),
            market: Box::new(market),
            reply,
        })
        .await?
    }

    pub async fn record_approval(&self, at: DateTime<Utc>) -> Result<(), RiskError> {
        self.send(RiskCommand::RecordApproval { at }).await
    }

    pub async fn record_result(&self, result: TradeResult) -> Result<(), RiskError> {
        self.send(RiskCommand::RecordResult(result)).await
    }

    pub async fn record_critical_failure(
        &self,
        signal: CriticalFailureSignal,
    ) -> Result<(), RiskError> {
        self.send(RiskCommand::RecordCriticalFailure(signal)).await
    }

    pub async fn clear_halt(&self, at: DateTime<Utc>) -> Result<bool, RiskError> {
        self.request(|reply| RiskCommand::ClearHalt { at, reply }).await
    }

    pub async fn update_balance(&self, balance: Decimal) -> Result<(), RiskError> {
        self.send(RiskCommand::UpdateBalance(balance)).await
    }

    pub async fn status(&self, at: DateTime<Utc>) -> Result<RiskStatus, RiskError> {
        self.request(|reply| RiskCommand::Status { at, reply }).await
    }

    pub async fn export_state(&self) -> Result<RiskState, RiskError> {
        self.request(|reply| RiskCommand::ExportState { reply }).await
    }
}

//! risk-gate - command-line front end for the risk pipeline
//!
//! Each invocation loads one account's risk state from a JSON file, applies a
//! single command through the per-account `RiskService`, writes the state
//! back and prints the outcome as JSON on stdout. Logs go to stderr.
//!
//! # Usage
//! ```sh
//! risk-gate --state futures.json --prefix FUTURES_ evaluate request.json
//! risk-gate --state futures.json record-result --symbol BTCUSDT --pnl -2.5
//! risk-gate --state futures.json status
//! risk-gate --state futures.json clear-halt
//! ```
//!
//! # Environment Variables
//! Risk thresholds are read by `RiskEnvConfig`, optionally under `--prefix`.
//! `RUST_LOG` controls log verbosity (default: info).

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use riskgate::application::risk_management::{RiskManager, RiskService, RiskServiceHandle};
use riskgate::config::RiskEnvConfig;
use riskgate::domain::market::MarketConditions;
use riskgate::domain::risk::RiskObserver;
use riskgate::domain::risk::state::RiskState;
use riskgate::domain::trading::account::AccountSnapshot;
use riskgate::domain::trading::types::{CriticalFailureSignal, TradeProposal, TradeResult};
use riskgate::infrastructure::observability::{FanoutObserver, RiskMetrics, TracingObserver};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{Level, info};
use tracing_subscriber::prelude::*;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON file holding the account's risk state (created on first use)
    #[arg(short, long, default_value = "risk_state.json")]
    state: PathBuf,

    /// Environment variable prefix for a per-account profile, e.g. FUTURES_
    #[arg(short, long, default_value = "")]
    prefix: String,

    /// Account label used in logs
    #[arg(short, long, default_value = "default")]
    account: String,

    /// Print Prometheus metrics for this run to stderr
    #[arg(long)]
    metrics: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a proposal from a JSON request file ("-" for stdin)
    Evaluate {
        request: PathBuf,

        /// Count an approval toward the rate limit, as if it was executed
        #[arg(long)]
        record_approval: bool,
    },
    /// Record the outcome of a closed position
    RecordResult {
        #[arg(long)]
        symbol: String,

        /// Realized P&L in quote currency (negative for a loss)
        #[arg(long, allow_hyphen_values = true)]
        pnl: Decimal,

        /// Account balance after the close
        #[arg(long)]
        balance_after: Option<Decimal>,

        /// Close time (RFC 3339, default: now)
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
    /// Halt trading after an infrastructure failure
    RecordFailure {
        #[arg(long)]
        reason: String,
    },
    /// Show the circuit breaker, daily loss and drawdown state
    Status {
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
    /// Clear an active circuit breaker halt
    ClearHalt,
}

#[derive(Deserialize)]
struct EvaluateRequest {
    proposal: TradeProposal,
    snapshot: AccountSnapshot,
    #[serde(default)]
    market: MarketConditions,
}

#[derive(Serialize)]
struct ClearHaltOutput {
    cleared: bool,
}

#[derive(Serialize)]
struct AckOutput {
    recorded: &'static str,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // stdout is reserved for JSON output
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stderr_layer)
        .init();

    let cli = Cli::parse();

    let config = RiskEnvConfig::from_env_with_prefix(&cli.prefix)?.into_risk_config()?;
    let metrics = RiskMetrics::new()?;
    let tracing_observer: Arc<dyn RiskObserver> =
        Arc::new(TracingObserver::new(cli.account.clone()));
    let metrics_observer: Arc<dyn RiskObserver> = Arc::new(metrics.clone());
    let observer: Arc<dyn RiskObserver> = Arc::new(FanoutObserver::new(vec![
        tracing_observer,
        metrics_observer,
    ]));

    let manager = match load_state(&cli.state)? {
        Some(state) => RiskManager::restore(config, observer, state)?,
        None => {
            info!(path = %cli.state.display(), "No saved risk state, starting fresh");
            RiskManager::new(config, observer)?
        }
    };

    let (service, handle) = RiskService::new(cli.account.clone(), manager);
    let task = service.with_metrics(metrics.clone()).spawn();

    let output = run_command(&handle, cli.command).await;
    drop(handle);
    let manager = task.await.context("RiskService task panicked")?;
    let output = output?;

    save_state(&cli.state, &manager.export_state())?;
    println!("{}", output);

    if cli.metrics {
        eprintln!("{}", metrics.render());
    }
    Ok(())
}

async fn run_command(handle: &RiskServiceHandle, command: Commands) -> Result<String> {
    let output = match command {
        Commands::Evaluate {
            request,
            record_approval,
        } => {
            let request: EvaluateRequest = serde_json::from_str(&read_input(&request)?)
                .context("Failed to parse evaluation request")?;
            let as_of = request.snapshot.as_of;
            let verdict = handle
                .evaluate(request.proposal, request.snapshot, request.market)
                .await?;
            if record_approval && verdict.is_approved() {
                handle.record_approval(as_of).await?;
            }
            serde_json::to_string_pretty(&verdict)?
        }
        Commands::RecordResult {
            symbol,
            pnl,
            balance_after,
            at,
        } => {
            let mut result = TradeResult::new(symbol, pnl, at.unwrap_or_else(Utc::now));
            if let Some(balance) = balance_after {
                result = result.with_balance_after(balance);
            }
            handle.record_result(result).await?;
            serde_json::to_string_pretty(&handle.status(Utc::now()).await?)?
        }
        Commands::RecordFailure { reason } => {
            handle
                .record_critical_failure(CriticalFailureSignal::new(reason, Utc::now()))
                .await?;
            serde_json::to_string_pretty(&AckOutput {
                recorded: "critical_failure",
            })?
        }
        Commands::Status { at } => {
            serde_json::to_string_pretty(&handle.status(at.unwrap_or_else(Utc::now)).await?)?
        }
        Commands::ClearHalt => {
            let cleared = handle.clear_halt(Utc::now()).await?;
            serde_json::to_string_pretty(&ClearHaltOutput { cleared })?
        }
    };
    Ok(output)
}

fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read request from stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn load_state(path: &Path) -> Result<Option<RiskState>> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read risk state {}", path.display()))?;
    let state = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse risk state {}", path.display()))?;
    Ok(Some(state))
}

fn save_state(path: &Path, state: &RiskState) -> Result<()> {
    let json = serde_json::to_string_pretty(state)?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write risk state {}", path.display()))
}

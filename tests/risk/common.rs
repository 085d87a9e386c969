use chrono::{DateTime, TimeZone, Utc};
use riskgate::application::risk_management::RiskManager;
use riskgate::domain::risk::RiskConfig;
use riskgate::domain::trading::account::AccountSnapshot;
use riskgate::domain::trading::types::{TradeProposal, TradeResult, TradeSide};
use riskgate::infrastructure::observability::EventLog;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

/// 2024-03-10 09:30 UTC
pub fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 10, 9, 30, 0).unwrap()
}

pub fn manager_with(config: RiskConfig) -> (RiskManager, Arc<EventLog>) {
    let log = Arc::new(EventLog::new());
    let manager = RiskManager::new(config, log.clone()).expect("valid config");
    (manager, log)
}

pub fn default_manager() -> (RiskManager, Arc<EventLog>) {
    manager_with(RiskConfig::default())
}

pub fn btc_long() -> TradeProposal {
    TradeProposal::new("BTCUSDT", TradeSide::Long, dec!(50000)).with_leverage(dec!(3))
}

pub fn account(total: Decimal, at: DateTime<Utc>) -> AccountSnapshot {
    AccountSnapshot::new(total, at)
}

pub fn loss(amount: Decimal, at: DateTime<Utc>) -> TradeResult {
    TradeResult::new("BTCUSDT", -amount, at)
}

pub fn win(amount: Decimal, at: DateTime<Utc>) -> TradeResult {
    TradeResult::new("BTCUSDT", amount, at)
}

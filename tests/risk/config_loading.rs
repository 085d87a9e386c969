//! Environment profiles feeding real managers.

use super::common::{account, btc_long, start};
use riskgate::application::risk_management::RiskManager;
use riskgate::config::RiskEnvConfig;
use riskgate::domain::errors::RiskError;
use riskgate::domain::risk::RiskConfig;
use riskgate::infrastructure::observability::EventLog;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::Arc;

fn env(vars: &[(&str, &str)]) -> HashMap<String, String> {
    vars.iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn test_account_profiles_from_one_environment() {
    let vars = env(&[
        ("POSITION_SIZE_PCT", "0.05"),
        ("FUTURES_MAX_LEVERAGE", "20"),
        ("SPOT_MAX_LEVERAGE", "1"),
        ("SPOT_POSITION_SIZE_PCT", "0.20"),
    ]);

    let futures = RiskEnvConfig::from_lookup("FUTURES_", |key| vars.get(key).cloned())
        .unwrap()
        .into_risk_config()
        .unwrap();
    let spot = RiskEnvConfig::from_lookup("SPOT_", |key| vars.get(key).cloned())
        .unwrap()
        .into_risk_config()
        .unwrap();

    let mut futures = RiskManager::new(futures, Arc::new(EventLog::new())).unwrap();
    let mut spot = RiskManager::new(spot, Arc::new(EventLog::new())).unwrap();
    let snapshot = account(dec!(1000), start());
    let proposal = btc_long().with_leverage(dec!(15));

    let futures_trade = futures.evaluate(proposal.clone(), &snapshot).unwrap();
    let futures_trade = futures_trade.proposal().unwrap();
    assert_eq!(futures_trade.size, Some(dec!(50)));
    assert_eq!(futures_trade.leverage, dec!(15));

    let spot_trade = spot.evaluate(proposal, &snapshot).unwrap();
    let spot_trade = spot_trade.proposal().unwrap();
    assert_eq!(spot_trade.size, Some(dec!(200)));
    assert_eq!(spot_trade.leverage, dec!(1));
}

#[test]
fn test_invalid_profile_fails_before_any_evaluation() {
    let vars = env(&[("VOLATILITY_EXTREME_RATIO", "1.2")]);
    let err = RiskEnvConfig::from_lookup("", |key| vars.get(key).cloned())
        .unwrap()
        .into_risk_config()
        .unwrap_err();
    assert!(format!("{:#}", err).contains("volatility_extreme_ratio"));
}

#[test]
fn test_manager_rejects_invalid_config_directly() {
    let mut config = RiskConfig::default();
    config.correlation.groups.push(vec!["SOL".to_string()]);
    let result = RiskManager::new(config, Arc::new(EventLog::new()));
    assert!(matches!(result, Err(RiskError::Configuration(_))));
}

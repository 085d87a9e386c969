//! End-to-end scenarios through the full layer chain.

use super::common::{account, btc_long, default_manager, manager_with, start};
use chrono::Duration;
use riskgate::domain::errors::RiskError;
use riskgate::domain::market::{BookLevel, MarketConditions, OrderBookDepth, VolatilitySeries};
use riskgate::domain::risk::RiskConfig;
use riskgate::domain::trading::types::{TradeProposal, TradeResult, TradeSide};
use rust_decimal_macros::dec;

#[test]
fn test_hundred_dollar_account_sizes_ten_dollars() {
    let (mut manager, _) = default_manager();
    let verdict = manager.evaluate(btc_long(), &account(dec!(100), start())).unwrap();

    let approved = verdict.proposal().expect("approved");
    assert_eq!(approved.size, Some(dec!(10)));
    assert_eq!(approved.risk_fraction, Some(dec!(0.10)));
    assert_eq!(approved.leverage, dec!(3));
    assert_eq!(approved.stop_price, Some(dec!(49000)));
}

#[test]
fn test_deep_drawdown_rejected_by_maximum_drawdown() {
    let (mut manager, log) = default_manager();
    let snapshot = account(dec!(83), start()).with_peak_balance(dec!(105));

    let verdict = manager.evaluate(btc_long(), &snapshot).unwrap();

    assert_eq!(verdict.rejecting_layer(), Some("MaximumDrawdown"));
    assert!(verdict.rejection_reason().unwrap().contains("20.95%"));
    assert_eq!(log.rejections()[0].0, "MaximumDrawdown");
}

#[test]
fn test_early_cutoff_moves_ceiling_rejection_to_position_sizing() {
    let mut config = RiskConfig::default();
    config.position_sizing.early_drawdown_cutoff = true;
    let (mut manager, _) = manager_with(config);
    let snapshot = account(dec!(83), start()).with_peak_balance(dec!(105));

    let verdict = manager.evaluate(btc_long(), &snapshot).unwrap();
    assert_eq!(verdict.rejecting_layer(), Some("PositionSizing"));
}

#[test]
fn test_daily_loss_at_limit_rejected() {
    let (mut manager, _) = default_manager();
    manager.record_result(&TradeResult::new("ETHUSDT", dec!(-5), start()));

    let verdict = manager
        .evaluate(btc_long(), &account(dec!(95), start() + Duration::minutes(5)))
        .unwrap();
    assert_eq!(verdict.rejecting_layer(), Some("DailyLossLimit"));
}

#[test]
fn test_correlated_exposure_rejected() {
    let (mut manager, _) = default_manager();
    let snapshot = account(dec!(1000), start())
        .with_position("ETHUSDT", dec!(100))
        .with_position("WETHUSDT", dec!(100));
    let proposal = TradeProposal::new("STETHUSDT", TradeSide::Long, dec!(3000));

    let verdict = manager.evaluate(proposal, &snapshot).unwrap();
    assert_eq!(verdict.rejecting_layer(), Some("CorrelationRisk"));

    // An uncorrelated symbol is still fine.
    let proposal = TradeProposal::new("SOLUSDT", TradeSide::Long, dec!(150));
    assert!(manager.evaluate(proposal, &snapshot).unwrap().is_approved());
}

#[test]
fn test_extreme_volatility_shrinks_size_and_widens_stop() {
    let (mut manager, log) = default_manager();
    let mut returns: Vec<f64> = (0..20)
        .map(|i| if i % 2 == 0 { 0.001 } else { -0.001 })
        .collect();
    returns.extend([0.05, -0.05, 0.05, -0.05, 0.05]);
    let market = MarketConditions::new().with_volatility(VolatilitySeries::new(returns));

    let verdict = manager
        .evaluate_with_market(btc_long(), &account(dec!(100), start()), &market)
        .unwrap();

    let approved = verdict.proposal().expect("volatility never rejects");
    assert_eq!(approved.size, Some(dec!(2.5)));
    assert_eq!(approved.stop_price, Some(dec!(46000)));
    assert_eq!(log.count("adjusted"), 4);
}

#[test]
fn test_liquidity_guards_thin_and_shallow_books() {
    let (mut manager, _) = default_manager();
    let snapshot = account(dec!(100000), start());
    let book = |qty| {
        MarketConditions::new().with_order_book(OrderBookDepth::new(
            vec![BookLevel::new(dec!(49990), qty)],
            vec![BookLevel::new(dec!(50010), qty)],
        ))
    };

    // Size caps at 1000, leverage 3: 3000 of exposure.
    let thin = manager
        .evaluate_with_market(btc_long(), &snapshot, &book(dec!(0.1)))
        .unwrap();
    assert!(thin.rejection_reason().unwrap().contains("LONG depth"));

    let shallow = manager
        .evaluate_with_market(btc_long(), &snapshot, &book(dec!(0.5)))
        .unwrap();
    assert_eq!(shallow.rejecting_layer(), Some("LiquidityCheck"));
    assert!(shallow.rejection_reason().unwrap().contains("visible depth"));

    let deep = manager
        .evaluate_with_market(btc_long(), &snapshot, &book(dec!(2)))
        .unwrap();
    assert!(deep.is_approved());
}

#[test]
fn test_invalid_book_fails_closed() {
    let (mut manager, _) = default_manager();
    let market = MarketConditions::new().with_order_book(OrderBookDepth::new(
        vec![],
        vec![BookLevel::new(dec!(0), dec!(1))],
    ));

    let result = manager.evaluate_with_market(btc_long(), &account(dec!(100), start()), &market);
    assert!(matches!(
        result,
        Err(RiskError::LayerFault { layer: "LiquidityCheck", .. })
    ));
}

#[test]
fn test_rate_limit_counts_recorded_approvals() {
    let (mut manager, _) = default_manager();
    let at = start();
    for i in 0..10 {
        manager.record_approval(at + Duration::seconds(i));
    }

    let snapshot = account(dec!(100), at + Duration::seconds(30));
    let verdict = manager.evaluate(btc_long(), &snapshot).unwrap();
    assert_eq!(verdict.rejecting_layer(), Some("RateLimit"));

    // Every recorded approval has left the 60s window.
    let later = account(dec!(100), at + Duration::seconds(70));
    assert!(manager.evaluate(btc_long(), &later).unwrap().is_approved());
}

#[test]
fn test_capital_floor_vetoes_last() {
    let mut config = RiskConfig::default();
    config.drawdown.max_drawdown_pct = dec!(0.95);
    config.position_sizing.min_position_size = dec!(0.1);
    let (mut manager, _) = manager_with(config);

    let verdict = manager.evaluate(btc_long(), &account(dec!(9), start())).unwrap();
    assert_eq!(verdict.rejecting_layer(), Some("CapitalPreservation"));
}

#[test]
fn test_malformed_proposal_fails_closed() {
    let (mut manager, log) = default_manager();
    let proposal = btc_long().with_leverage(dec!(0.5));

    let result = manager.evaluate(proposal, &account(dec!(100), start()));
    assert!(matches!(result, Err(RiskError::MalformedProposal { .. })));
    assert!(log.is_empty());
}

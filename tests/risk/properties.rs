//! Invariants checked over small input grids.

use super::common::{account, btc_long, default_manager, loss, start};
use chrono::Duration;
use riskgate::domain::market::MarketConditions;
use riskgate::domain::trading::types::{TradeProposal, TradeResult, TradeSide};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

#[test]
fn test_drawdown_at_or_above_ceiling_always_rejected() {
    let peak = dec!(100);
    for total in [dec!(85), dec!(80), dec!(50), dec!(1)] {
        for side in [TradeSide::Long, TradeSide::Short] {
            for confidence in [0.2, 0.6, 1.0] {
                let (mut manager, _) = default_manager();
                let proposal = TradeProposal::new("XRPUSDT", side, dec!(0.6))
                    .with_leverage(dec!(2))
                    .with_confidence(confidence);
                let snapshot = account(total, start()).with_peak_balance(peak);

                let verdict = manager.evaluate(proposal, &snapshot).unwrap();
                assert!(verdict.is_rejected(), "total {} approved", total);
                // Low confidence can trip the leverage floor first.
                let layer = verdict.rejecting_layer().unwrap();
                assert!(
                    layer == "MaximumDrawdown" || layer == "LeverageControl",
                    "total {} rejected by {}",
                    total,
                    layer
                );
                if confidence >= 0.6 {
                    assert_eq!(layer, "MaximumDrawdown");
                }
            }
        }
    }
}

#[test]
fn test_leverage_never_exceeds_max_or_request() {
    let max = dec!(10);
    for requested in 1..=20 {
        let requested = Decimal::from(requested);
        for step in 0..=10 {
            let confidence = f64::from(step) / 10.0;
            for total in [dec!(100), dec!(93), dec!(88)] {
                let (mut manager, _) = default_manager();
                let proposal = btc_long()
                    .with_leverage(requested)
                    .with_confidence(confidence);
                let verdict = manager.evaluate(proposal, &account(total, start())).unwrap();

                match verdict.proposal() {
                    Some(approved) => {
                        assert!(approved.leverage <= max);
                        assert!(approved.leverage <= requested);
                        assert!(approved.leverage >= Decimal::ONE);
                    }
                    None => assert_eq!(verdict.rejecting_layer(), Some("LeverageControl")),
                }
            }
        }
    }
}

#[test]
fn test_repeated_evaluation_is_idempotent() {
    let (mut manager, _) = default_manager();
    let snapshot = account(dec!(100), start());

    // Plain approval.
    let first = manager.evaluate(btc_long(), &snapshot).unwrap();
    let second = manager.evaluate(btc_long(), &snapshot).unwrap();
    assert_eq!(first, second);

    // New trading day.
    manager.record_result(&loss(dec!(2), start()));
    let next_day = account(dec!(98), start() + Duration::days(1));
    let first = manager.evaluate(btc_long(), &next_day).unwrap();
    let second = manager.evaluate(btc_long(), &next_day).unwrap();
    assert_eq!(first, second);

    // A flash crash halts on the first call; the second sees the same halt.
    let crash = btc_long().with_current_price(dec!(40000));
    let first = manager
        .evaluate_with_market(crash.clone(), &next_day, &MarketConditions::default())
        .unwrap();
    let second = manager
        .evaluate_with_market(crash, &next_day, &MarketConditions::default())
        .unwrap();
    assert!(first.is_rejected());
    assert_eq!(first, second);
}

#[test]
fn test_peak_is_monotonic_for_every_ordering() {
    let balances = [dec!(90), dec!(130), dec!(110), dec!(150)];
    let orderings: [[usize; 4]; 6] = [
        [0, 1, 2, 3],
        [3, 2, 1, 0],
        [1, 0, 3, 2],
        [2, 3, 0, 1],
        [0, 3, 1, 2],
        [3, 0, 2, 1],
    ];

    for ordering in orderings {
        let (mut manager, _) = default_manager();
        let mut previous = manager.peak_balance();
        let mut running_max = previous;
        for (step, index) in ordering.into_iter().enumerate() {
            let balance = balances[index];
            let closed_at = start() + Duration::minutes(step as i64);
            let result =
                TradeResult::new("BTCUSDT", dec!(1), closed_at).with_balance_after(balance);
            manager.record_result(&result);

            running_max = running_max.max(balance);
            assert!(manager.peak_balance() >= previous);
            assert_eq!(manager.peak_balance(), running_max);
            previous = manager.peak_balance();
        }
    }
}

//! Day-boundary and peak-tracking behaviour across evaluations.

use super::common::{account, btc_long, default_manager, loss, manager_with, start};
use chrono::{Duration, TimeZone, Utc};
use riskgate::domain::risk::{RiskConfig, RiskEvent};
use riskgate::domain::trading::types::TradeResult;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

#[test]
fn test_daily_pnl_resets_once_after_midnight() {
    let (mut manager, log) = default_manager();
    let late = Utc.with_ymd_and_hms(2024, 3, 10, 23, 0, 0).unwrap();
    manager.record_result(&loss(dec!(3), late));
    assert_eq!(manager.daily_pnl(), dec!(-3));

    let after_midnight = Utc.with_ymd_and_hms(2024, 3, 11, 0, 0, 1).unwrap();
    let verdict = manager
        .evaluate(btc_long(), &account(dec!(97), after_midnight))
        .unwrap();
    assert!(verdict.is_approved());
    assert_eq!(manager.daily_pnl(), Decimal::ZERO);
    assert_eq!(log.count("daily_reset"), 1);
    assert!(log.events().contains(&RiskEvent::DailyReset {
        date: after_midnight.date_naive(),
        previous_pnl: dec!(-3),
    }));

    // Mid-day activity never resets again.
    manager.record_result(&loss(dec!(1), after_midnight + Duration::hours(2)));
    manager
        .evaluate(btc_long(), &account(dec!(96), after_midnight + Duration::hours(3)))
        .unwrap();
    assert_eq!(manager.daily_pnl(), dec!(-1));
    assert_eq!(log.count("daily_reset"), 1);
}

#[test]
fn test_day_boundary_follows_configured_offset() {
    let mut config = RiskConfig::default();
    config.daily_loss.utc_offset_minutes = -300;
    let (mut manager, _) = manager_with(config);

    // 22:00 local on the 10th.
    manager.record_result(&loss(dec!(5), Utc.with_ymd_and_hms(2024, 3, 11, 3, 0, 0).unwrap()));

    let before_local_midnight = Utc.with_ymd_and_hms(2024, 3, 11, 4, 30, 0).unwrap();
    let verdict = manager
        .evaluate(btc_long(), &account(dec!(95), before_local_midnight))
        .unwrap();
    assert_eq!(verdict.rejecting_layer(), Some("DailyLossLimit"));

    let after_local_midnight = Utc.with_ymd_and_hms(2024, 3, 11, 5, 30, 0).unwrap();
    let verdict = manager
        .evaluate(btc_long(), &account(dec!(95), after_local_midnight))
        .unwrap();
    assert!(verdict.is_approved());
}

#[test]
fn test_results_from_previous_day_are_not_counted() {
    let (mut manager, _) = default_manager();
    let today = Utc.with_ymd_and_hms(2024, 3, 11, 10, 0, 0).unwrap();
    manager.evaluate(btc_long(), &account(dec!(100), today)).unwrap();

    manager.record_result(&loss(dec!(5), Utc.with_ymd_and_hms(2024, 3, 10, 23, 0, 0).unwrap()));
    assert_eq!(manager.daily_pnl(), Decimal::ZERO);
}

#[test]
fn test_stored_peak_drives_drawdown() {
    let (mut manager, log) = default_manager();
    manager.update_balance(dec!(120));
    assert_eq!(log.count("peak_updated"), 1);

    // The snapshot only knows a peak of 100; the stored 120 still applies.
    let verdict = manager.evaluate(btc_long(), &account(dec!(100), start())).unwrap();
    assert_eq!(verdict.rejecting_layer(), Some("MaximumDrawdown"));
    assert!(verdict.rejection_reason().unwrap().contains("16.67%"));
}

#[test]
fn test_balance_after_result_raises_peak_only_upward() {
    let (mut manager, _) = default_manager();
    let result = TradeResult::new("BTCUSDT", dec!(15), start()).with_balance_after(dec!(115));
    manager.record_result(&result);
    assert_eq!(manager.peak_balance(), dec!(115));

    manager.record_result(
        &TradeResult::new("BTCUSDT", dec!(-10), start() + Duration::minutes(5))
            .with_balance_after(dec!(105)),
    );
    assert_eq!(manager.peak_balance(), dec!(115));
}

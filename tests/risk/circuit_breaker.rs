//! Circuit breaker state machine driven through the manager.

use super::common::{account, btc_long, default_manager, loss, manager_with, start, win};
use chrono::Duration;
use riskgate::domain::market::MarketConditions;
use riskgate::domain::risk::{RiskConfig, RiskEvent};
use riskgate::domain::risk::state::HaltReason;
use riskgate::domain::trading::types::{CriticalFailureSignal, TradeProposal, TradeSide};
use rust_decimal_macros::dec;

#[test]
fn test_consecutive_losses_halt_then_auto_resume() {
    let (mut manager, log) = default_manager();
    for i in 0..5 {
        manager.record_result(&loss(dec!(0.5), start() + Duration::minutes(i)));
    }
    let halted_at = start() + Duration::minutes(4);
    assert!(manager.is_halted_at(halted_at));
    assert_eq!(log.count("halted"), 1);

    let one_second_later = account(dec!(97.5), halted_at + Duration::seconds(1));
    let verdict = manager.evaluate(btc_long(), &one_second_later).unwrap();
    assert_eq!(verdict.rejecting_layer(), Some("CircuitBreaker"));
    let reason = verdict.rejection_reason().unwrap();
    assert!(reason.contains("5 consecutive losses"), "{}", reason);
    assert!(reason.contains("resumes in 47h 59m 59s"), "{}", reason);

    let after_window = account(dec!(97.5), halted_at + Duration::hours(48));
    let verdict = manager.evaluate(btc_long(), &after_window).unwrap();
    assert!(verdict.is_approved());
    assert_eq!(manager.consecutive_losses(), 0);
    assert!(log.events().contains(&RiskEvent::Resumed {
        at: halted_at + Duration::hours(48),
        manual: false,
    }));
}

#[test]
fn test_loss_after_expired_halt_does_not_rehalt() {
    let (mut manager, log) = default_manager();
    for _ in 0..5 {
        manager.record_result(&loss(dec!(0.5), start()));
    }

    // No evaluation between the end of the halt and the next result.
    let later = start() + Duration::hours(49);
    manager.record_result(&loss(dec!(0.1), later));
    assert_eq!(manager.consecutive_losses(), 1);
    assert!(!manager.is_halted_at(later));
    assert_eq!(log.count("halted"), 1);

    let verdict = manager.evaluate(btc_long(), &account(dec!(97.4), later)).unwrap();
    assert!(verdict.is_approved());
}

#[test]
fn test_win_resets_loss_streak() {
    let (mut manager, _) = default_manager();
    for _ in 0..4 {
        manager.record_result(&loss(dec!(0.1), start()));
    }
    manager.record_result(&win(dec!(0.2), start()));
    for _ in 0..4 {
        manager.record_result(&loss(dec!(0.1), start()));
    }
    assert_eq!(manager.consecutive_losses(), 4);
    assert!(!manager.is_halted_at(start()));
}

#[test]
fn test_zero_duration_halt_needs_manual_clear() {
    let mut config = RiskConfig::default();
    config.circuit_breaker.halt_duration_hours = 0;
    let (mut manager, log) = manager_with(config);

    let signal = CriticalFailureSignal::new("exchange API unreachable", start());
    manager.record_critical_failure(&signal);

    let month_later = account(dec!(100), start() + Duration::days(30));
    let verdict = manager.evaluate(btc_long(), &month_later).unwrap();
    let reason = verdict.rejection_reason().unwrap();
    assert!(reason.contains("exchange API unreachable"));
    assert!(reason.contains("requires manual clear"));
    assert_eq!(manager.halt_remaining(month_later.as_of), None);

    assert!(manager.clear_halt(month_later.as_of));
    assert!(!manager.clear_halt(month_later.as_of));
    assert!(manager.evaluate(btc_long(), &month_later).unwrap().is_approved());
    assert_eq!(log.count("resumed"), 1);
}

#[test]
fn test_flash_crash_from_current_price_halts_everything() {
    let (mut manager, log) = default_manager();
    let crashing = btc_long().with_current_price(dec!(44000));

    let verdict = manager.evaluate(crashing, &account(dec!(100), start())).unwrap();
    assert_eq!(verdict.rejecting_layer(), Some("CircuitBreaker"));

    let halted = log
        .events()
        .into_iter()
        .find_map(|event| match event {
            RiskEvent::Halted { reason, .. } => Some(reason),
            _ => None,
        })
        .expect("halt event");
    assert_eq!(
        halted,
        HaltReason::FlashCrash {
            symbol: "BTCUSDT".to_string(),
            drop_pct: dec!(0.12),
        }
    );

    // The halt is account-wide.
    let eth = TradeProposal::new("ETHUSDT", TradeSide::Short, dec!(3000));
    let verdict = manager
        .evaluate(eth, &account(dec!(100), start() + Duration::minutes(1)))
        .unwrap();
    assert_eq!(verdict.rejecting_layer(), Some("CircuitBreaker"));
}

#[test]
fn test_flash_crash_from_recent_price_window() {
    let (mut manager, _) = default_manager();
    let market = MarketConditions::new().with_recent_prices(vec![
        dec!(50000),
        dec!(51000),
        dec!(47000),
        dec!(45000),
    ]);

    let verdict = manager
        .evaluate_with_market(btc_long(), &account(dec!(100), start()), &market)
        .unwrap();
    assert_eq!(verdict.rejecting_layer(), Some("CircuitBreaker"));
    assert!(manager.is_halted_at(start()));
}

#[test]
fn test_disabled_breaker_never_halts() {
    let mut config = RiskConfig::default();
    config.circuit_breaker.enabled = false;
    let (mut manager, log) = manager_with(config);

    for _ in 0..10 {
        manager.record_result(&loss(dec!(0.1), start()));
    }
    manager.record_critical_failure(&CriticalFailureSignal::new("feed down", start()));

    assert!(!manager.is_halted_at(start()));
    assert_eq!(log.count("halted"), 0);
    let verdict = manager.evaluate(btc_long(), &account(dec!(99), start())).unwrap();
    assert!(verdict.is_approved());
}

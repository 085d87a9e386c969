//! Per-account services running side by side.

use super::common::{account, btc_long, loss, start};
use chrono::Duration;
use riskgate::application::risk_management::{RiskManager, RiskService, RiskServiceHandle};
use riskgate::domain::errors::RiskError;
use riskgate::domain::market::MarketConditions;
use riskgate::domain::risk::RiskConfig;
use riskgate::domain::trading::types::CriticalFailureSignal;
use riskgate::infrastructure::observability::{EventLog, RiskMetrics};
use rust_decimal_macros::dec;
use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};

fn spawn(account: &str, config: RiskConfig) -> (RiskServiceHandle, Arc<EventLog>) {
    let log = Arc::new(EventLog::new());
    let manager = RiskManager::new(config, log.clone()).unwrap();
    let (service, handle) = RiskService::new(account, manager);
    service.spawn();
    (handle, log)
}

#[tokio::test]
async fn test_accounts_do_not_share_state() {
    let mut futures_config = RiskConfig::default();
    futures_config.leverage.max_leverage = dec!(20);
    let mut spot_config = RiskConfig::default();
    spot_config.leverage.max_leverage = dec!(1);

    let (futures, _) = spawn("futures", futures_config);
    let (spot, _) = spawn("spot", spot_config);

    assert_ok!(
        futures
            .record_critical_failure(CriticalFailureSignal::new("futures gateway down", start()))
            .await
    );

    let snapshot = account(dec!(100), start() + Duration::seconds(1));
    let (futures_verdict, spot_verdict) = tokio::join!(
        futures.evaluate(btc_long(), snapshot.clone(), MarketConditions::default()),
        spot.evaluate(btc_long(), snapshot, MarketConditions::default()),
    );

    let futures_verdict = futures_verdict.unwrap();
    assert_eq!(futures_verdict.rejecting_layer(), Some("CircuitBreaker"));

    let spot_verdict = spot_verdict.unwrap();
    assert_eq!(spot_verdict.proposal().unwrap().leverage, dec!(1));
}

#[tokio::test]
async fn test_concurrent_callers_are_serialized() {
    let (handle, log) = spawn("futures", RiskConfig::default());

    let mut tasks = Vec::new();
    for i in 0..20 {
        let handle = handle.clone();
        tasks.push(tokio::spawn(async move {
            let at = start() + Duration::seconds(i);
            let verdict = handle
                .evaluate(btc_long(), account(dec!(100), at), MarketConditions::default())
                .await?;
            if verdict.is_approved() {
                handle.record_approval(at).await?;
            }
            Ok::<_, RiskError>(verdict)
        }));
    }

    let mut approved = 0;
    for task in tasks {
        if task.await.unwrap().unwrap().is_approved() {
            approved += 1;
        }
    }

    // Rejections only start once ten approvals are on record.
    let status = handle.status(start() + Duration::seconds(19)).await.unwrap();
    assert_eq!(status.approvals_in_window, 10);
    assert!(approved >= 10);
    assert_eq!(log.count("approved"), approved);
}

#[tokio::test]
async fn test_rate_limit_through_service() {
    let (handle, _) = spawn("spot", RiskConfig::default());

    for i in 0..10 {
        let at = start() + Duration::seconds(i);
        let verdict = handle
            .evaluate(btc_long(), account(dec!(100), at), MarketConditions::default())
            .await
            .unwrap();
        assert!(verdict.is_approved(), "approval {} rejected", i);
        handle.record_approval(at).await.unwrap();
    }

    let verdict = handle
        .evaluate(
            btc_long(),
            account(dec!(100), start() + Duration::seconds(10)),
            MarketConditions::default(),
        )
        .await
        .unwrap();
    assert_eq!(verdict.rejecting_layer(), Some("RateLimit"));
}

#[tokio::test]
async fn test_state_survives_service_restart() {
    let log = Arc::new(EventLog::new());
    let manager = RiskManager::new(RiskConfig::default(), log.clone()).unwrap();
    let (service, handle) = RiskService::new("futures", manager);
    let task = service.spawn();

    for _ in 0..5 {
        handle.record_result(loss(dec!(0.2), start())).await.unwrap();
    }
    let state = handle.export_state().await.unwrap();
    drop(handle);
    assert_ok!(task.await);

    let json = serde_json::to_string(&state).unwrap();
    let restored = serde_json::from_str(&json).unwrap();
    let manager = RiskManager::restore(RiskConfig::default(), log, restored).unwrap();
    let (service, handle) = RiskService::new("futures", manager);
    service.spawn();

    let status = handle.status(start() + Duration::hours(1)).await.unwrap();
    assert!(status.halted);
    assert_eq!(status.halt_remaining_seconds, Some(47 * 3600));
}

#[tokio::test]
async fn test_metrics_follow_service_activity() {
    let metrics = RiskMetrics::new().unwrap();
    let manager = RiskManager::new(RiskConfig::default(), Arc::new(metrics.clone())).unwrap();
    let (service, handle) = RiskService::new("futures", manager);
    service.with_metrics(metrics.clone()).spawn();

    handle
        .evaluate(btc_long(), account(dec!(100), start()), MarketConditions::default())
        .await
        .unwrap();
    handle
        .record_critical_failure(CriticalFailureSignal::new("ws disconnected", start()))
        .await
        .unwrap();
    handle.status(start()).await.unwrap();

    assert_eq!(metrics.approvals_total.get(), 1);
    assert_eq!(metrics.circuit_breaker_status.get(), 1.0);
    assert_eq!(metrics.evaluation_latency_seconds.get_sample_count(), 1);
    assert!(metrics.render().contains("riskgate_halts_total{trigger=\"critical_failure\"} 1"));
}

#[tokio::test]
async fn test_dropped_service_reports_unavailable() {
    let manager = RiskManager::new(RiskConfig::default(), Arc::new(EventLog::new())).unwrap();
    let (service, handle) = RiskService::new("spot", manager);
    drop(service);

    assert_err!(handle.record_approval(start()).await);
    let err = handle.clear_halt(start()).await.unwrap_err();
    assert!(err.to_string().contains("spot"));
}

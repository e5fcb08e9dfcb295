//! End-to-end pipeline tests: probe → store → aggregate → alert → notify
//!
//! The probe and check actors only share the store, exactly like in
//! production; the mock server plays the monitored website.

use std::sync::Arc;

use assert_matches::assert_matches;
use tokio::sync::broadcast;
use vigil::Notification;
use vigil::actors::checker::CheckHandle;
use vigil::actors::prober::ProbeHandle;
use vigil::storage::StorageBackend;
use vigil::storage::memory::MemoryBackend;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::helpers::test_target_config;

#[tokio::test]
async fn test_failing_website_raises_alert_end_to_end() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let store = Arc::new(MemoryBackend::new());
    let config = test_target_config(&mock_server.uri());

    let (event_tx, mut event_rx) = broadcast::channel(16);
    let probe = ProbeHandle::spawn(config.clone(), store.clone());
    let check = CheckHandle::spawn(config, store.clone(), event_tx);

    for _ in 0..5 {
        probe.probe_now().await.unwrap();
    }

    let notification = check.check_now().await.unwrap();
    assert_matches!(
        notification,
        Notification::Alert { availability, .. } if availability == 0.0
    );

    // The transition was published outward
    let event = event_rx.recv().await.unwrap();
    assert_eq!(event.target, mock_server.uri());
    assert_matches!(event.notification, Notification::Alert { .. });

    // And persisted
    let stored = store
        .query_last_alert_event(&mock_server.uri())
        .await
        .unwrap()
        .unwrap();
    assert!(stored.on_alert());

    probe.shutdown().await;
    check.shutdown().await;
}

#[tokio::test]
async fn test_recovery_follows_alert_end_to_end() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let store = Arc::new(MemoryBackend::new());
    let config = test_target_config(&mock_server.uri());

    let (event_tx, mut event_rx) = broadcast::channel(16);
    let probe = ProbeHandle::spawn(config.clone(), store.clone());
    let check = CheckHandle::spawn(config, store.clone(), event_tx);

    // Down window: alert
    for _ in 0..5 {
        probe.probe_now().await.unwrap();
    }
    let alert = check.check_now().await.unwrap();
    let original_start = match alert {
        Notification::Alert { start_date, .. } => start_date,
        other => panic!("expected alert, got {other:?}"),
    };

    // The website comes back: enough up-samples to lift the window above
    // the threshold (5 down + 25 up = 25/30 ≈ 0.83)
    mock_server.reset().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    for _ in 0..25 {
        probe.probe_now().await.unwrap();
    }

    let recovery = check.check_now().await.unwrap();
    assert_matches!(
        recovery,
        Notification::Recovery { start_date, .. } if start_date == original_start
    );

    // Both transitions were published, in order
    assert_matches!(
        event_rx.recv().await.unwrap().notification,
        Notification::Alert { .. }
    );
    assert_matches!(
        event_rx.recv().await.unwrap().notification,
        Notification::Recovery { .. }
    );

    // A further check on the healthy window is a no-op
    assert_eq!(check.check_now().await.unwrap(), Notification::None);

    probe.shutdown().await;
    check.shutdown().await;
}

#[tokio::test]
async fn test_check_without_samples_never_alerts() {
    let store = Arc::new(MemoryBackend::new());
    let (event_tx, mut event_rx) = broadcast::channel(16);

    let check = CheckHandle::spawn(
        test_target_config("https://never-probed.example"),
        store.clone(),
        event_tx,
    );

    // Absence of evidence is not evidence of failure
    assert_eq!(check.check_now().await.unwrap(), Notification::None);
    assert!(event_rx.try_recv().is_err());
    assert!(
        store
            .query_last_alert_event("https://never-probed.example")
            .await
            .unwrap()
            .is_none()
    );

    check.shutdown().await;
}

//! Persistence tests: the state machine recovers from the store alone
//!
//! Only run with the storage-sqlite feature; these tests reopen the same
//! database file to simulate a restart and a second monitoring process.

use std::sync::Arc;

use assert_matches::assert_matches;
use vigil::alert::AlertChecker;
use vigil::{AlertKind, Notification};
use vigil::storage::StorageBackend;
use vigil::storage::sqlite::SqliteBackend;

use crate::helpers::{sample_at, seed_window};

const TARGET: &str = "https://example.com";

#[tokio::test]
async fn test_samples_survive_reopen() {
    let temp_dir = tempfile::tempdir().unwrap();
    let db_path = temp_dir.path().join("monitoring.db");

    {
        let backend = SqliteBackend::new(&db_path).await.unwrap();
        seed_window(&backend, TARGET, 3, 1).await;
        backend.close().await.unwrap();
    }

    let backend = SqliteBackend::new(&db_path).await.unwrap();
    let window = backend
        .query_window(TARGET, chrono::Utc::now() - chrono::Duration::minutes(5))
        .await
        .unwrap();

    assert_eq!(window.len(), 4);
}

#[tokio::test]
async fn test_alert_state_survives_restart() {
    let temp_dir = tempfile::tempdir().unwrap();
    let db_path = temp_dir.path().join("monitoring.db");

    // First process: observes a down window and raises the alert
    let original_start = {
        let backend = Arc::new(SqliteBackend::new(&db_path).await.unwrap());
        seed_window(backend.as_ref(), TARGET, 2, 8).await;

        let checker = AlertChecker::new(backend.clone());
        let notification = checker.check_alert(TARGET).await.unwrap();

        let start = match notification {
            Notification::Alert { start_date, .. } => start_date,
            other => panic!("expected alert, got {other:?}"),
        };

        backend.close().await.unwrap();
        start
    };

    // Second process (or the first after a restart): no in-memory state,
    // only the database. The website has recovered in the meantime.
    let backend = Arc::new(SqliteBackend::new(&db_path).await.unwrap());
    for i in 0..90 {
        backend
            .insert_sample(&sample_at(TARGET, i, true))
            .await
            .unwrap();
    }

    let checker = AlertChecker::new(backend.clone());
    let notification = checker.check_alert(TARGET).await.unwrap();

    // The recovery closes the alert raised before the restart
    assert_matches!(
        notification,
        Notification::Recovery { start_date, .. }
            if start_date.timestamp_millis() == original_start.timestamp_millis()
    );

    let stored = backend.query_last_alert_event(TARGET).await.unwrap().unwrap();
    assert_eq!(stored.event.kind, AlertKind::Recovery);

    backend.close().await.unwrap();
}

#[tokio::test]
async fn test_two_backends_on_one_file_share_the_event_log() {
    let temp_dir = tempfile::tempdir().unwrap();
    let db_path = temp_dir.path().join("monitoring.db");

    let first = Arc::new(SqliteBackend::new(&db_path).await.unwrap());
    let second = Arc::new(SqliteBackend::new(&db_path).await.unwrap());

    seed_window(first.as_ref(), TARGET, 0, 5).await;

    // Both processes observe "normal" with low availability
    let checker_a = AlertChecker::new(first.clone());
    let checker_b = AlertChecker::new(second.clone());

    let (a, b) = tokio::join!(checker_a.check_alert(TARGET), checker_b.check_alert(TARGET));

    // One of them persisted the transition; the conditional append rejected
    // any duplicate. Both views agree on a single Alert event.
    let last_a = first.query_last_alert_event(TARGET).await.unwrap().unwrap();
    let last_b = second.query_last_alert_event(TARGET).await.unwrap().unwrap();
    assert_eq!(last_a.id, last_b.id);
    assert_eq!(last_a.event.kind, AlertKind::Alert);

    let oks = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
    assert!(oks >= 1, "at least one checker must conclude");

    first.close().await.unwrap();
    second.close().await.unwrap();
}

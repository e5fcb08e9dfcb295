//! Integration tests for probe semantics
//!
//! These tests verify that:
//! - Every probe outcome becomes exactly one stored sample
//! - The availability predicate is status < 400
//! - Transport failures yield samples with no status and no response time
//! - The probe respects its timeout budget

use std::sync::Arc;
use std::time::Instant;

use chrono::{Duration, Utc};
use vigil::actors::prober::ProbeHandle;
use vigil::storage::StorageBackend;
use vigil::storage::memory::MemoryBackend;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::helpers::test_target_config;

#[tokio::test]
async fn test_successful_probe_stores_up_sample() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
        .mount(&mock_server)
        .await;

    let store = Arc::new(MemoryBackend::new());
    let handle = ProbeHandle::spawn(test_target_config(&mock_server.uri()), store.clone());

    let sample = handle.probe_now().await.unwrap();

    assert!(sample.available);
    assert_eq!(sample.status_code, Some(200));
    assert!(sample.response_time_ms.is_some());

    let window = store
        .query_window(&mock_server.uri(), Utc::now() - Duration::minutes(1))
        .await
        .unwrap();
    assert_eq!(window.len(), 1);
    assert_eq!(window[0], sample);

    handle.shutdown().await;
}

#[tokio::test]
async fn test_client_error_counts_as_unavailable() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
        .mount(&mock_server)
        .await;

    let store = Arc::new(MemoryBackend::new());
    let handle = ProbeHandle::spawn(test_target_config(&mock_server.uri()), store);

    let sample = handle.probe_now().await.unwrap();

    // The server answered, but a 4xx signals the service malfunctioning for
    // this caller
    assert!(!sample.available);
    assert_eq!(sample.status_code, Some(404));
    assert!(sample.response_time_ms.is_some());

    handle.shutdown().await;
}

#[tokio::test]
async fn test_server_error_keeps_status_and_response_time() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&mock_server)
        .await;

    let store = Arc::new(MemoryBackend::new());
    let handle = ProbeHandle::spawn(test_target_config(&mock_server.uri()), store);

    let sample = handle.probe_now().await.unwrap();

    assert!(!sample.available);
    assert_eq!(sample.status_code, Some(500));
    assert!(sample.response_time_ms.is_some());

    handle.shutdown().await;
}

#[tokio::test]
async fn test_timeout_yields_down_sample_within_budget() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(std::time::Duration::from_secs(5))
                .set_body_string("Slow response"),
        )
        .mount(&mock_server)
        .await;

    let store = Arc::new(MemoryBackend::new());
    // test_target_config sets a 1 second timeout
    let handle = ProbeHandle::spawn(test_target_config(&mock_server.uri()), store);

    let started = Instant::now();
    let sample = handle.probe_now().await.unwrap();
    let elapsed = started.elapsed();

    assert!(!sample.available);
    assert_eq!(sample.status_code, None);
    assert_eq!(sample.response_time_ms, None);

    // The probe gave up within its own timeout budget, not the server's delay
    assert!(elapsed < std::time::Duration::from_secs(3));

    handle.shutdown().await;
}

#[tokio::test]
async fn test_connection_refused_yields_down_sample() {
    let store = Arc::new(MemoryBackend::new());
    // Nothing listens on port 1
    let handle = ProbeHandle::spawn(test_target_config("http://127.0.0.1:1"), store);

    let sample = handle.probe_now().await.unwrap();

    assert!(!sample.available);
    assert_eq!(sample.status_code, None);
    assert_eq!(sample.response_time_ms, None);

    handle.shutdown().await;
}

#[tokio::test]
async fn test_each_probe_stores_exactly_one_sample() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let store = Arc::new(MemoryBackend::new());
    let handle = ProbeHandle::spawn(test_target_config(&mock_server.uri()), store.clone());

    for _ in 0..3 {
        handle.probe_now().await.unwrap();
    }

    let window = store
        .query_window(&mock_server.uri(), Utc::now() - Duration::minutes(1))
        .await
        .unwrap();
    assert_eq!(window.len(), 3);

    handle.shutdown().await;
}

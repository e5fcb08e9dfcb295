//! Helper functions for integration tests

use chrono::{Duration, Utc};
use vigil::Sample;
use vigil::config::ResolvedTargetConfig;
use vigil::storage::StorageBackend;

pub fn test_target_config(url: &str) -> ResolvedTargetConfig {
    ResolvedTargetConfig {
        url: url.to_string(),
        display_name: format!("Test {url}"),
        probe_interval: 60,
        check_interval: 60,
        timeout: 1,
    }
}

/// A sample `offset_secs` in the past. Up-samples get a 200 and a response
/// time; down-samples get a 500 (the service answered, badly).
pub fn sample_at(target: &str, offset_secs: i64, available: bool) -> Sample {
    Sample {
        target: target.to_string(),
        timestamp: Utc::now() - Duration::seconds(offset_secs),
        available,
        status_code: Some(if available { 200 } else { 500 }),
        response_time_ms: Some(10.0),
    }
}

/// Seed a recent window with `up` available and `down` unavailable samples.
pub async fn seed_window(store: &dyn StorageBackend, target: &str, up: usize, down: usize) {
    for i in 0..up + down {
        store
            .insert_sample(&sample_at(target, i as i64, i < up))
            .await
            .unwrap();
    }
}

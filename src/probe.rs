//! Availability probing
//!
//! One probe is one GET against one target. Every outcome — including
//! timeouts, refused connections, DNS failures, and malformed URLs — is
//! encoded in the returned [`Sample`]; the HTTP leg itself never fails.
//! Only the subsequent store write can surface an error.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{instrument, trace};

use crate::Sample;
use crate::storage::{StorageBackend, StorageResult};

/// A response with a status at or above this counts as unavailable.
///
/// 4xx is counted as down on purpose: it signals the service malfunctioning
/// for that caller, even though the server answered.
pub const FAILURE_STATUS_THRESHOLD: u16 = 400;

/// Whether a received status code counts as available.
pub fn status_is_available(status: u16) -> bool {
    status < FAILURE_STATUS_THRESHOLD
}

/// Probes a single target and appends the result to the store.
///
/// The HTTP client is built once with the configured timeout and reused
/// across probes.
pub struct Prober {
    client: reqwest::Client,
    store: Arc<dyn StorageBackend>,
}

impl Prober {
    pub fn new(store: Arc<dyn StorageBackend>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .expect("Failed to build HTTP client"),
            store,
        }
    }

    /// Probe `target` once and store the resulting sample.
    ///
    /// Exactly one sample is written per invocation, with its timestamp set
    /// at probe completion. The only error this returns is a storage
    /// failure.
    #[instrument(skip(self))]
    pub async fn probe(&self, target: &str) -> StorageResult<Sample> {
        let sample = self.execute(target).await;
        self.store.insert_sample(&sample).await?;
        Ok(sample)
    }

    /// Run the HTTP leg of a probe, mapping every failure mode into the
    /// sample itself.
    async fn execute(&self, target: &str) -> Sample {
        trace!("probing {target}");

        let start = Instant::now();

        match self.client.get(target).send().await {
            Ok(response) => {
                let response_time_ms = start.elapsed().as_secs_f64() * 1000.0;
                let status = response.status().as_u16();

                Sample {
                    target: target.to_string(),
                    timestamp: Utc::now(),
                    available: status_is_available(status),
                    status_code: Some(status),
                    response_time_ms: Some(response_time_ms),
                }
            }
            Err(e) => {
                // Timeout, refused, DNS, malformed URL: all become a
                // down-sample with no status and no response time.
                trace!("probe transport failure for {target}: {e}");

                Sample {
                    target: target.to_string(),
                    timestamp: Utc::now(),
                    available: false,
                    status_code: None,
                    response_time_ms: None,
                }
            }
        }
    }
}

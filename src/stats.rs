//! Windowed statistics over stored samples
//!
//! The computation (`WindowStats::from_samples`) is separated from the
//! store query (`Aggregator::get_stats`) so the math can be tested without
//! a backend.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::instrument;

use crate::Sample;
use crate::storage::{StorageBackend, StorageResult};

/// Key of the status-code breakdown.
///
/// Samples without a status code (transport failures) are counted under
/// `NoResponse` instead of being dropped, so downtime stays visible in the
/// breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusBucket {
    Status(u16),
    NoResponse,
}

/// Response-time summary over the samples that carry one.
#[derive(Debug, Clone, PartialEq)]
pub struct LatencySummary {
    pub min_ms: f64,
    pub max_ms: f64,
    pub avg_ms: f64,
}

/// Statistics for one target over one trailing window. Derived, never
/// persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowStats {
    /// Fraction of samples in the window classified as available, in [0, 1]
    pub availability: f64,

    /// Sample count per status bucket
    pub status_codes: HashMap<StatusBucket, u64>,

    /// `None` when no sample in the window carries a response time —
    /// distinct from a summary of 0 ms
    pub latency: Option<LatencySummary>,
}

impl WindowStats {
    /// Compute stats over a window of samples, or `None` for an empty
    /// window. Callers must not attempt further computation on `None`.
    pub fn from_samples(samples: &[Sample]) -> Option<WindowStats> {
        if samples.is_empty() {
            return None;
        }

        let total = samples.len() as f64;
        let available = samples.iter().filter(|sample| sample.available).count() as f64;

        let mut status_codes: HashMap<StatusBucket, u64> = HashMap::new();
        for sample in samples {
            let bucket = match sample.status_code {
                Some(code) => StatusBucket::Status(code),
                None => StatusBucket::NoResponse,
            };
            *status_codes.entry(bucket).or_default() += 1;
        }

        let response_times: Vec<f64> = samples
            .iter()
            .filter_map(|sample| sample.response_time_ms)
            .collect();

        let latency = if response_times.is_empty() {
            None
        } else {
            let sum: f64 = response_times.iter().sum();
            Some(LatencySummary {
                min_ms: response_times.iter().cloned().fold(f64::INFINITY, f64::min),
                max_ms: response_times
                    .iter()
                    .cloned()
                    .fold(f64::NEG_INFINITY, f64::max),
                avg_ms: sum / response_times.len() as f64,
            })
        };

        Some(WindowStats {
            availability: available / total,
            status_codes,
            latency,
        })
    }
}

/// Computes windowed statistics by querying the shared store.
#[derive(Clone)]
pub struct Aggregator {
    store: Arc<dyn StorageBackend>,
}

impl Aggregator {
    pub fn new(store: Arc<dyn StorageBackend>) -> Self {
        Self { store }
    }

    /// Stats for `target` over the trailing `window_minutes`.
    ///
    /// `Ok(None)` means the window holds no samples — a normal outcome, not
    /// an error.
    #[instrument(skip(self))]
    pub async fn get_stats(
        &self,
        target: &str,
        window_minutes: i64,
    ) -> StorageResult<Option<WindowStats>> {
        let since = Utc::now() - Duration::minutes(window_minutes);
        let samples = self.store.query_window(target, since).await?;
        Ok(WindowStats::from_samples(&samples))
    }
}

//! In-memory storage backend (no persistence)
//!
//! Keeps samples and alert events in a mutex-guarded map. Useful for:
//! - Testing without database dependencies
//! - Running with `"storage": { "backend": "none" }`
//!
//! ## Limitations
//!
//! - **No persistence**: all data lost on restart
//! - **Single process**: the conditional append only coordinates checkers
//!   inside this process; sharing one store across processes requires a
//!   persistent backend

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::{AlertEvent, Sample};

use super::backend::{HealthStatus, StorageBackend};
use super::error::{StorageError, StorageResult};
use super::schema::StoredAlertEvent;

#[derive(Default)]
struct MemoryState {
    /// Samples grouped by target, in insertion order
    samples: HashMap<String, Vec<Sample>>,

    /// Alert events across all targets, ascending by id
    alert_events: Vec<StoredAlertEvent>,

    /// Next alert-event id to assign
    next_event_id: i64,
}

/// In-memory storage backend
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryState::default()),
        }
    }

    fn last_event_id_for(state: &MemoryState, target: &str) -> Option<i64> {
        state
            .alert_events
            .iter()
            .rev()
            .find(|stored| stored.event.target == target)
            .map(|stored| stored.id)
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn insert_sample(&self, sample: &Sample) -> StorageResult<()> {
        let mut state = self.state.lock().expect("memory store poisoned");
        state
            .samples
            .entry(sample.target.clone())
            .or_default()
            .push(sample.clone());
        Ok(())
    }

    async fn insert_alert_event(
        &self,
        event: &AlertEvent,
        expected_last_id: Option<i64>,
    ) -> StorageResult<i64> {
        let mut state = self.state.lock().expect("memory store poisoned");

        let current_last = Self::last_event_id_for(&state, &event.target);
        if current_last != expected_last_id {
            return Err(StorageError::Conflict {
                target: event.target.clone(),
                expected_last_id,
            });
        }

        let id = state.next_event_id;
        state.next_event_id += 1;
        state.alert_events.push(StoredAlertEvent {
            id,
            event: event.clone(),
        });

        Ok(id)
    }

    async fn query_window(
        &self,
        target: &str,
        since: DateTime<Utc>,
    ) -> StorageResult<Vec<Sample>> {
        let state = self.state.lock().expect("memory store poisoned");

        let mut samples: Vec<Sample> = state
            .samples
            .get(target)
            .map(|all| {
                all.iter()
                    .filter(|sample| sample.timestamp > since)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        samples.sort_by_key(|sample| sample.timestamp);
        Ok(samples)
    }

    async fn query_last_alert_event(
        &self,
        target: &str,
    ) -> StorageResult<Option<StoredAlertEvent>> {
        let state = self.state.lock().expect("memory store poisoned");
        Ok(state
            .alert_events
            .iter()
            .rev()
            .find(|stored| stored.event.target == target)
            .cloned())
    }

    async fn health_check(&self) -> StorageResult<HealthStatus> {
        let state = self.state.lock().expect("memory store poisoned");
        let total_samples: usize = state.samples.values().map(Vec::len).sum();

        Ok(HealthStatus {
            healthy: true,
            message: "In-memory storage operational".to_string(),
            metadata: HashMap::from([
                ("backend".to_string(), "memory".to_string()),
                ("total_samples".to_string(), total_samples.to_string()),
                (
                    "total_alert_events".to_string(),
                    state.alert_events.len().to_string(),
                ),
            ]),
        })
    }

    async fn close(&self) -> StorageResult<()> {
        debug!("closing in-memory backend (no-op)");
        Ok(())
    }
}

//! Storage backend trait definition
//!
//! This module defines the core `StorageBackend` trait that all
//! storage implementations must implement.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{AlertEvent, Sample};

use super::error::StorageResult;
use super::schema::StoredAlertEvent;

/// Health status of the storage backend
#[derive(Debug, Clone)]
pub struct HealthStatus {
    /// Is the backend operational?
    pub healthy: bool,

    /// Human-readable status message
    pub message: String,

    /// Additional backend-specific metadata
    pub metadata: std::collections::HashMap<String, String>,
}

/// Trait for sample and alert-event persistence
///
/// The store is the only shared resource between probers and checkers —
/// possibly across several independent monitoring processes pointed at the
/// same database. All coordination the pipeline needs is expressed here:
///
/// - **Samples are append-only**: one insert per probe, never mutated.
/// - **Alert events are a conditional append**: `insert_alert_event` only
///   succeeds if the caller's view of the target's latest event is still
///   current. This is what upholds the Alert/Recovery alternation invariant
///   under concurrent checkers.
///
/// ## Thread Safety
///
/// Implementations must be `Send + Sync` as they are shared across async
/// tasks behind an `Arc`.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Append one probe result.
    async fn insert_sample(&self, sample: &Sample) -> StorageResult<()>;

    /// Conditionally append one alert event.
    ///
    /// The append succeeds only if the latest stored event id for
    /// `event.target` still equals `expected_last_id` (`None` meaning "no
    /// event stored yet"). Otherwise the call fails with
    /// [`StorageError::Conflict`](super::StorageError::Conflict) and nothing
    /// is written — the caller lost a race against another checker and must
    /// re-read before deciding again.
    ///
    /// Returns the id assigned to the new event.
    async fn insert_alert_event(
        &self,
        event: &AlertEvent,
        expected_last_id: Option<i64>,
    ) -> StorageResult<i64>;

    /// Samples for `target` with `timestamp > since`, ascending by time.
    ///
    /// An empty result is a normal outcome, not an error.
    async fn query_window(&self, target: &str, since: DateTime<Utc>)
    -> StorageResult<Vec<Sample>>;

    /// The most recent alert event for `target`, or `None` if the target
    /// has never transitioned.
    async fn query_last_alert_event(
        &self,
        target: &str,
    ) -> StorageResult<Option<StoredAlertEvent>>;

    /// Check backend health
    ///
    /// Performs a lightweight operation to verify the backend
    /// is operational (e.g., ping database, check file access).
    async fn health_check(&self) -> StorageResult<HealthStatus>;

    /// Close the backend and release resources
    async fn close(&self) -> StorageResult<()>;
}

//! Persisted row forms
//!
//! Two logical tables back the pipeline:
//!
//! - `samples(target, timestamp, available, status_code, response_time_ms)` —
//!   append-only probe results, indexed on `(target, timestamp)` for window
//!   scans.
//! - `alert_events(id, target, kind, start_date, end_date, availability)` —
//!   the alert/recovery log. `id` is assigned by the store, increases
//!   monotonically, and doubles as the compare-and-swap token for the
//!   conditional append (see `StorageBackend::insert_alert_event`).
//!
//! `Sample` and `AlertEvent` are stored as-is; the only storage-specific
//! wrapper is `StoredAlertEvent`, which carries the assigned id back to
//! readers.

use crate::AlertEvent;

/// An alert event as read back from the store, with its assigned id.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredAlertEvent {
    /// Store-assigned sequence number, monotonically increasing per store
    pub id: i64,

    pub event: AlertEvent,
}

impl StoredAlertEvent {
    /// Whether the target is considered on alert after this event.
    pub fn on_alert(&self) -> bool {
        self.event.kind == crate::AlertKind::Alert
    }
}

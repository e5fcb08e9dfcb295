//! Alert/recovery state machine
//!
//! Persisted state is the single source of truth. Every check re-reads the
//! last stored alert event instead of trusting an in-memory flag, so the
//! machine survives restarts and stays consistent across several monitoring
//! processes sharing one store. Writes go through the store's conditional
//! append; a checker that loses the race gets a `Conflict` and skips the
//! cycle rather than desynchronize from persisted truth.
//!
//! ## Transition table
//!
//! ```text
//! state    availability   action
//! normal   >= threshold   no-op
//! normal   <  threshold   persist Alert(start = now), announce
//! alert    <  threshold   re-announce with the stored start date, no write
//! alert    >= threshold   persist Recovery(start = stored start, end = now)
//! ```

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, instrument};

use crate::stats::Aggregator;
use crate::storage::{StorageBackend, StorageError, StoredAlertEvent};
use crate::{AlertEvent, AlertKind, Notification};

/// Availability below this raises an alert. Policy constant; do not change
/// without product input.
pub const ALERT_THRESHOLD: f64 = 0.8;

/// Trailing window the alert decision is computed over, in minutes.
pub const ALERT_WINDOW_MINUTES: i64 = 2;

/// Outcome of comparing windowed availability against the persisted state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertEvaluation {
    /// Normal and above threshold: nothing to do
    Ok,

    /// Normal but below threshold: raise an alert
    Degraded,

    /// Already on alert and still below threshold: re-announce, no write
    StillDown,

    /// On alert and back above threshold: close the alert
    Recovered,
}

impl AlertEvaluation {
    /// Pure transition decision. The threshold is strict: availability
    /// exactly at the threshold does not alert.
    pub fn evaluate(on_alert: bool, availability: f64, threshold: f64) -> Self {
        match (on_alert, availability < threshold) {
            (false, false) => AlertEvaluation::Ok,
            (false, true) => AlertEvaluation::Degraded,
            (true, true) => AlertEvaluation::StillDown,
            (true, false) => AlertEvaluation::Recovered,
        }
    }
}

/// Runs the alert state machine for one target at a time.
#[derive(Clone)]
pub struct AlertChecker {
    store: Arc<dyn StorageBackend>,
    aggregator: Aggregator,
}

impl AlertChecker {
    pub fn new(store: Arc<dyn StorageBackend>) -> Self {
        let aggregator = Aggregator::new(store.clone());
        Self { store, aggregator }
    }

    /// Decide and persist the next alert transition for `target`.
    ///
    /// A window without samples returns `Notification::None`: silence is
    /// never itself alertable. Storage failures (including a lost append
    /// race) surface as errors so the caller skips the cycle instead of
    /// proceeding on stale state.
    #[instrument(skip(self))]
    pub async fn check_alert(&self, target: &str) -> Result<Notification, StorageError> {
        let last = self.store.query_last_alert_event(target).await?;

        let Some(stats) = self
            .aggregator
            .get_stats(target, ALERT_WINDOW_MINUTES)
            .await?
        else {
            return Ok(Notification::None);
        };

        let on_alert = last.as_ref().is_some_and(StoredAlertEvent::on_alert);
        let evaluation = AlertEvaluation::evaluate(on_alert, stats.availability, ALERT_THRESHOLD);

        let notification = match (evaluation, &last) {
            (AlertEvaluation::Ok, _) => Notification::None,

            (AlertEvaluation::Degraded, last) => {
                let now = Utc::now();
                let event = AlertEvent {
                    target: target.to_string(),
                    kind: AlertKind::Alert,
                    availability: stats.availability,
                    start_date: now,
                    end_date: None,
                };

                self.store
                    .insert_alert_event(&event, last.as_ref().map(|stored| stored.id))
                    .await?;

                debug!(
                    "{target}: availability {:.2} below {:.2}, alert raised",
                    stats.availability, ALERT_THRESHOLD
                );

                Notification::Alert {
                    target: target.to_string(),
                    availability: stats.availability,
                    start_date: now,
                }
            }

            (AlertEvaluation::StillDown, Some(active)) => Notification::Alert {
                target: target.to_string(),
                availability: stats.availability,
                start_date: active.event.start_date,
            },

            (AlertEvaluation::Recovered, Some(active)) => {
                let now = Utc::now();
                let event = AlertEvent {
                    target: target.to_string(),
                    kind: AlertKind::Recovery,
                    availability: stats.availability,
                    // A recovery closes the alert it belongs to
                    start_date: active.event.start_date,
                    end_date: Some(now),
                };

                self.store.insert_alert_event(&event, Some(active.id)).await?;

                debug!(
                    "{target}: availability {:.2} recovered above {:.2}",
                    stats.availability, ALERT_THRESHOLD
                );

                Notification::Recovery {
                    target: target.to_string(),
                    availability: stats.availability,
                    start_date: active.event.start_date,
                    end_date: now,
                }
            }

            // on_alert implies a stored event, so these arms cannot be hit
            (AlertEvaluation::StillDown | AlertEvaluation::Recovered, None) => Notification::None,
        };

        Ok(notification)
    }
}

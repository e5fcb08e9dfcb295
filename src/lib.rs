pub mod actors;
pub mod alert;
pub mod config;
pub mod notify;
pub mod probe;
pub mod stats;
pub mod storage;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One probe result for one target at one point in time.
///
/// `available = false` may still carry a `status_code` (e.g. a 5xx answer),
/// but `response_time_ms` is only present when a response was actually
/// received. Samples are append-only once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub target: String,
    pub timestamp: DateTime<Utc>,
    pub available: bool,
    pub status_code: Option<u16>,
    pub response_time_ms: Option<f64>,
}

/// Kind of a persisted alert transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Alert,
    Recovery,
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertKind::Alert => write!(f, "alert"),
            AlertKind::Recovery => write!(f, "recovery"),
        }
    }
}

impl FromStr for AlertKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "alert" => Ok(AlertKind::Alert),
            "recovery" => Ok(AlertKind::Recovery),
            other => Err(format!("unknown alert kind: {other}")),
        }
    }
}

/// One alert-or-recovery transition for one target.
///
/// For a given target the persisted sequence strictly alternates
/// Alert, Recovery, Alert, ... A Recovery's `start_date` equals the
/// `start_date` of the Alert it closes; `end_date` is only present on
/// Recovery events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub target: String,
    pub kind: AlertKind,
    pub availability: f64,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
}

/// Outcome of one alert check, consumed by the presentation layer.
///
/// A tagged variant rather than a loose map, so consumers cannot observe
/// an invalid field combination such as an `end_date` without a recovery.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Notification {
    None,
    Alert {
        target: String,
        availability: f64,
        start_date: DateTime<Utc>,
    },
    Recovery {
        target: String,
        availability: f64,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
    },
}

impl Notification {
    pub fn is_none(&self) -> bool {
        matches!(self, Notification::None)
    }
}

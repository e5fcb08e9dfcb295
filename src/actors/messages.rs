//! Message types for actor communication
//!
//! ## Design Principles
//!
//! 1. **Commands**: request/response messages sent to specific actors via mpsc
//! 2. **Events**: broadcast notifications published to multiple subscribers
//! 3. **Immutability**: events are cloneable for multi-subscriber patterns

use chrono::{DateTime, Utc};
use tokio::sync::oneshot;

use crate::{Notification, Sample};

/// Commands that can be sent to a ProbeActor
#[derive(Debug)]
pub enum ProbeCommand {
    /// Trigger an immediate probe (bypassing the interval timer)
    ///
    /// Used for testing and manual refresh operations.
    ProbeNow {
        /// Channel to send the result back
        respond_to: oneshot::Sender<anyhow::Result<Sample>>,
    },

    /// Update the probe interval
    ///
    /// The new interval takes effect when the actor re-arms.
    UpdateInterval {
        /// New interval in seconds
        interval_secs: u64,
    },

    /// Gracefully shut down the probe actor
    ///
    /// The actor stops re-arming and exits once any in-flight probe
    /// completes.
    Shutdown,
}

/// Commands that can be sent to a CheckActor
#[derive(Debug)]
pub enum CheckCommand {
    /// Trigger an immediate alert check
    CheckNow {
        respond_to: oneshot::Sender<anyhow::Result<Notification>>,
    },

    /// Update the check interval
    UpdateInterval { interval_secs: u64 },

    /// Gracefully shut down the check actor
    Shutdown,
}

/// Event published when a check produced a non-empty notification
///
/// This is the outward boundary of the core: presentation subscribers
/// (logger, webhook) consume these events. The broadcast channel may lag or
/// drop messages for slow subscribers; checks keep running regardless.
#[derive(Debug, Clone)]
pub struct NotificationEvent {
    /// The target the notification is about
    pub target: String,

    /// The transition (never `Notification::None`)
    pub notification: Notification,

    /// When the check concluded
    pub timestamp: DateTime<Utc>,
}

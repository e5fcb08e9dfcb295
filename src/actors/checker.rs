//! CheckActor - repeatedly runs the alert state machine for one target
//!
//! One actor per target, independent from that target's probe actor: the
//! only coupling is the shared store both sides read and write. Each cycle
//! aggregates the alert window, decides a transition, and publishes any
//! non-empty notification to the broadcast channel.
//!
//! A cycle that hits a storage failure is skipped; a cycle that loses the
//! conditional-append race is also skipped, since another checker has just
//! transitioned the same target and the next cycle will re-read the
//! persisted truth.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::sleep;
use tracing::{debug, error, instrument, trace, warn};

use crate::Notification;
use crate::alert::AlertChecker;
use crate::config::ResolvedTargetConfig;
use crate::storage::{StorageBackend, StorageError};

use super::messages::{CheckCommand, NotificationEvent};

/// Actor that runs alert checks for a single target
pub struct CheckActor {
    /// Target configuration
    config: ResolvedTargetConfig,

    /// The state machine (aggregation + transition decision + persistence)
    checker: AlertChecker,

    /// Command receiver for control messages
    command_rx: mpsc::Receiver<CheckCommand>,

    /// Broadcast sender for publishing notifications
    event_tx: broadcast::Sender<NotificationEvent>,

    /// Current check interval
    interval_duration: Duration,
}

impl CheckActor {
    pub fn new(
        config: ResolvedTargetConfig,
        store: Arc<dyn StorageBackend>,
        command_rx: mpsc::Receiver<CheckCommand>,
        event_tx: broadcast::Sender<NotificationEvent>,
    ) -> Self {
        let checker = AlertChecker::new(store);
        let interval_duration = Duration::from_secs(config.check_interval);

        Self {
            config,
            checker,
            command_rx,
            event_tx,
            interval_duration,
        }
    }

    /// Run the actor's main loop
    ///
    /// Runs until a Shutdown command is received or the command channel is
    /// closed. Re-arms after each check completes.
    #[instrument(skip(self), fields(target = %self.config.display_name))]
    pub async fn run(mut self) {
        debug!("starting check actor");

        loop {
            tokio::select! {
                _ = sleep(self.interval_duration) => {
                    if let Err(e) = self.check_once().await {
                        error!("check cycle failed: {:#}", e);
                    }
                }

                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(CheckCommand::CheckNow { respond_to }) => {
                            debug!("received CheckNow command");
                            let result = self.check_once().await;
                            let _ = respond_to.send(result);
                        }

                        Some(CheckCommand::UpdateInterval { interval_secs }) => {
                            debug!("updating interval to {interval_secs}s");
                            self.interval_duration = Duration::from_secs(interval_secs);
                        }

                        Some(CheckCommand::Shutdown) => {
                            debug!("received shutdown command");
                            break;
                        }

                        // All handles dropped - exit
                        None => {
                            warn!("command channel closed, shutting down");
                            break;
                        }
                    }
                }
            }
        }

        debug!("check actor stopped");
    }

    /// One check cycle: run the state machine, publish the outcome.
    async fn check_once(&self) -> Result<Notification> {
        let notification = match self.checker.check_alert(&self.config.url).await {
            Ok(notification) => notification,

            Err(StorageError::Conflict { .. }) => {
                // Another checker transitioned this target first. Skip the
                // cycle; the next one starts from the persisted state.
                warn!(
                    "{}: concurrent alert transition, skipping cycle",
                    self.config.display_name
                );
                return Ok(Notification::None);
            }

            Err(e) => return Err(e.into()),
        };

        if notification.is_none() {
            trace!("{}: no transition", self.config.display_name);
            return Ok(notification);
        }

        let event = NotificationEvent {
            target: self.config.url.clone(),
            notification: notification.clone(),
            timestamp: Utc::now(),
        };

        // It's OK if there are no subscribers; checks keep running and the
        // state is already persisted.
        match self.event_tx.send(event) {
            Ok(num_receivers) => {
                trace!("published notification to {num_receivers} receivers");
            }
            Err(_) => {
                trace!("no receivers for notification (this is OK)");
            }
        }

        Ok(notification)
    }
}

/// Handle for controlling a CheckActor
#[derive(Clone)]
pub struct CheckHandle {
    sender: mpsc::Sender<CheckCommand>,
    target: String,
}

impl CheckHandle {
    /// Spawn a new check actor
    pub fn spawn(
        config: ResolvedTargetConfig,
        store: Arc<dyn StorageBackend>,
        event_tx: broadcast::Sender<NotificationEvent>,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);
        let target = config.url.clone();

        let actor = CheckActor::new(config, store, cmd_rx, event_tx);

        tokio::spawn(actor.run());

        Self {
            sender: cmd_tx,
            target,
        }
    }

    /// Trigger an immediate check and return the notification
    pub async fn check_now(&self) -> Result<Notification> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(CheckCommand::CheckNow { respond_to: tx })
            .await?;

        rx.await?
    }

    /// Update the check interval
    pub async fn update_interval(&self, interval_secs: u64) -> Result<()> {
        self.sender
            .send(CheckCommand::UpdateInterval { interval_secs })
            .await?;
        Ok(())
    }

    /// Shut down the check actor
    pub async fn shutdown(self) {
        let _ = self.sender.send(CheckCommand::Shutdown).await;
    }

    /// Get the checked target URL
    pub fn target(&self) -> &str {
        &self.target
    }
}

// ============================================================================
// Tests
// ============================================================================

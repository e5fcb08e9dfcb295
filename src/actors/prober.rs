//! ProbeActor - repeatedly probes one target
//!
//! One actor per target. Each iteration sends a single GET, stores the
//! resulting sample, then re-arms by sleeping for the configured interval.
//! Probe failures are encoded in the sample; only storage failures make a
//! cycle fail, and a failed cycle is skipped, not retried.
//!
//! ## Message Flow
//!
//! ```text
//! sleep(interval) → probe → insert_sample → sleep(interval) → ...
//!     ↑
//!     └─── Commands (ProbeNow, UpdateInterval, Shutdown)
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::{mpsc, oneshot};
use tokio::time::sleep;
use tracing::{debug, error, instrument, warn};

use crate::Sample;
use crate::config::ResolvedTargetConfig;
use crate::probe::Prober;
use crate::storage::StorageBackend;

use super::messages::ProbeCommand;

/// Actor that probes a single target
pub struct ProbeActor {
    /// Target configuration
    config: ResolvedTargetConfig,

    /// Probe executor (owns the HTTP client)
    prober: Prober,

    /// Command receiver for control messages
    command_rx: mpsc::Receiver<ProbeCommand>,

    /// Current probe interval
    interval_duration: Duration,
}

impl ProbeActor {
    pub fn new(
        config: ResolvedTargetConfig,
        store: Arc<dyn StorageBackend>,
        command_rx: mpsc::Receiver<ProbeCommand>,
    ) -> Self {
        let prober = Prober::new(store, Duration::from_secs(config.timeout));
        let interval_duration = Duration::from_secs(config.probe_interval);

        Self {
            config,
            prober,
            command_rx,
            interval_duration,
        }
    }

    /// Run the actor's main loop
    ///
    /// Runs until a Shutdown command is received or the command channel is
    /// closed. The sleep re-arms after each probe completes, so drift
    /// accumulates by execution latency (see the module docs of
    /// [`crate::actors`]).
    #[instrument(skip(self), fields(target = %self.config.display_name))]
    pub async fn run(mut self) {
        debug!("starting probe actor");

        loop {
            tokio::select! {
                _ = sleep(self.interval_duration) => {
                    if let Err(e) = self.probe_once().await {
                        error!("probe cycle failed: {:#}", e);
                    }
                }

                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(ProbeCommand::ProbeNow { respond_to }) => {
                            debug!("received ProbeNow command");
                            let result = self.probe_once().await;
                            let _ = respond_to.send(result);
                        }

                        Some(ProbeCommand::UpdateInterval { interval_secs }) => {
                            debug!("updating interval to {interval_secs}s");
                            self.interval_duration = Duration::from_secs(interval_secs);
                        }

                        Some(ProbeCommand::Shutdown) => {
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

        debug!("probe actor stopped");
    }

    /// One probe cycle: GET the target, store the sample.
    ///
    /// Only a storage failure surfaces here; transport failures are already
    /// inside the sample.
    async fn probe_once(&self) -> Result<Sample> {
        let sample = self.prober.probe(&self.config.url).await?;
        Ok(sample)
    }
}

/// Handle for controlling a ProbeActor
#[derive(Clone)]
pub struct ProbeHandle {
    sender: mpsc::Sender<ProbeCommand>,
    target: String,
}

impl ProbeHandle {
    /// Spawn a new probe actor
    pub fn spawn(config: ResolvedTargetConfig, store: Arc<dyn StorageBackend>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);
        let target = config.url.clone();

        let actor = ProbeActor::new(config, store, cmd_rx);

        tokio::spawn(actor.run());

        Self {
            sender: cmd_tx,
            target,
        }
    }

    /// Trigger an immediate probe and return the stored sample
    pub async fn probe_now(&self) -> Result<Sample> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(ProbeCommand::ProbeNow { respond_to: tx })
            .await?;

        rx.await?
    }

    /// Update the probe interval
    pub async fn update_interval(&self, interval_secs: u64) -> Result<()> {
        self.sender
            .send(ProbeCommand::UpdateInterval { interval_secs })
            .await?;
        Ok(())
    }

    /// Shut down the probe actor
    pub async fn shutdown(self) {
        let _ = self.sender.send(ProbeCommand::Shutdown).await;
    }

    /// Get the probed target URL
    pub fn target(&self) -> &str {
        &self.target
    }
}

// ============================================================================
// Tests
// ============================================================================

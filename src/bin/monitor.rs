use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::broadcast;
use tracing::{debug, error, info, level_filters::LevelFilter, trace, warn};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};
use vigil::{
    actors::{checker::CheckHandle, messages::NotificationEvent, prober::ProbeHandle},
    config::{Config, StorageConfig, read_config_file},
    notify::Notifier,
    stats::Aggregator,
    storage::StorageBackend,
};

/// Seconds between periodic stats reports
const REPORT_INTERVAL_SECS: u64 = 10;

/// Trailing window the periodic report covers, in minutes
const REPORT_WINDOW_MINUTES: i64 = 10;

#[derive(Debug, Clone, Parser)]
struct Args {
    /// Config file
    #[arg(short)]
    file: String,
}

fn init() {
    dotenv::dotenv().ok();

    let filter = filter::Targets::new().with_targets(vec![
        ("vigil", LevelFilter::TRACE),
        ("monitor", LevelFilter::TRACE),
    ]);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init();
    let args = Args::parse();
    trace!("started with args: {args:?}");

    let config = read_config_file(&args.file)?;

    let store = build_backend(&config).await?;

    let health = store.health_check().await?;
    if !health.healthy {
        anyhow::bail!("storage backend unhealthy: {}", health.message);
    }
    debug!("storage: {}", health.message);

    let targets = config.resolve_targets();
    if targets.is_empty() {
        anyhow::bail!("no targets configured, nothing to monitor");
    }

    let (event_tx, event_rx) = broadcast::channel(64);

    let notifier = Notifier::new(config.webhook.clone());
    tokio::spawn(notification_listener(event_rx, notifier));

    tokio::spawn(report_stats(store.clone(), targets.clone()));

    let mut probe_handles = Vec::with_capacity(targets.len());
    let mut check_handles = Vec::with_capacity(targets.len());

    for target in targets {
        info!(
            "monitoring {} (probe every {}s, check every {}s)",
            target.display_name, target.probe_interval, target.check_interval
        );
        probe_handles.push(ProbeHandle::spawn(target.clone(), store.clone()));
        check_handles.push(CheckHandle::spawn(target, store.clone(), event_tx.clone()));
    }

    tokio::signal::ctrl_c().await?;
    info!("shutting down");

    for handle in probe_handles {
        handle.shutdown().await;
    }
    for handle in check_handles {
        handle.shutdown().await;
    }

    store.close().await?;

    Ok(())
}

async fn build_backend(config: &Config) -> anyhow::Result<Arc<dyn StorageBackend>> {
    match config.storage.clone().unwrap_or_default() {
        StorageConfig::None => {
            debug!("using in-memory storage (no persistence)");
            Ok(Arc::new(vigil::storage::memory::MemoryBackend::new()))
        }

        #[cfg(feature = "storage-sqlite")]
        StorageConfig::Sqlite { path } => {
            let backend = vigil::storage::sqlite::SqliteBackend::new(&path).await?;
            Ok(Arc::new(backend))
        }

        #[cfg(not(feature = "storage-sqlite"))]
        StorageConfig::Sqlite { .. } => {
            anyhow::bail!("sqlite storage requested, but built without the storage-sqlite feature")
        }
    }
}

/// Forward every published notification to the notifier.
async fn notification_listener(
    mut event_rx: broadcast::Receiver<NotificationEvent>,
    notifier: Notifier,
) {
    loop {
        match event_rx.recv().await {
            Ok(event) => {
                notifier.publish(&event.notification).await;
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!("notification listener lagged, skipped {skipped} notifications");
            }
            Err(broadcast::error::RecvError::Closed) => {
                debug!("notification channel closed");
                break;
            }
        }
    }
}

/// Periodically log windowed stats for every target.
async fn report_stats(
    store: Arc<dyn StorageBackend>,
    targets: Vec<vigil::config::ResolvedTargetConfig>,
) {
    let aggregator = Aggregator::new(store);

    loop {
        tokio::time::sleep(Duration::from_secs(REPORT_INTERVAL_SECS)).await;

        for target in &targets {
            match aggregator.get_stats(&target.url, REPORT_WINDOW_MINUTES).await {
                Ok(Some(stats)) => match &stats.latency {
                    Some(latency) => info!(
                        "{} [{}m]: availability {:.2}%, response time min/avg/max {:.0}/{:.0}/{:.0} ms",
                        target.display_name,
                        REPORT_WINDOW_MINUTES,
                        stats.availability * 100.0,
                        latency.min_ms,
                        latency.avg_ms,
                        latency.max_ms,
                    ),
                    None => info!(
                        "{} [{}m]: availability {:.2}%, no responses received",
                        target.display_name,
                        REPORT_WINDOW_MINUTES,
                        stats.availability * 100.0,
                    ),
                },
                Ok(None) => {
                    info!("{}: no data yet", target.display_name);
                }
                Err(e) => {
                    error!("{}: stats query failed: {e}", target.display_name);
                }
            }
        }
    }
}

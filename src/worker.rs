// Background stats logger for the live client.
// Logs an "app stats" line on a real-time interval and every connection status change.

use serde::Serialize;
use tokio::sync::{broadcast, oneshot, watch};
use tokio::time::{Duration, interval};

use crate::dispatch::Invalidation;
use crate::stores::LiveStores;
use crate::transport::ConnectionStatus;

/// Point-in-time counters; also served by GET /api/status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppStats {
    pub connection: ConnectionStatus,
    pub traces: usize,
    pub traffic_agents: usize,
    pub online_agents: usize,
    pub invalidation_listeners: usize,
}

pub fn collect_stats(
    stores: &LiveStores,
    connection: ConnectionStatus,
    invalidations: &broadcast::Sender<Invalidation>,
) -> AppStats {
    AppStats {
        connection,
        traces: stores.traces().len(),
        traffic_agents: stores.traffic().len(),
        online_agents: stores.agents().online_agents().len(),
        invalidation_listeners: invalidations.receiver_count(),
    }
}

/// Stores, channels, and shutdown for the stats logger.
pub struct StatsLoggerDeps {
    pub stores: LiveStores,
    pub status_rx: watch::Receiver<ConnectionStatus>,
    pub invalidations: broadcast::Sender<Invalidation>,
    pub shutdown_rx: oneshot::Receiver<()>,
}

pub struct StatsLoggerConfig {
    /// How often to log app stats (real seconds).
    pub stats_log_interval_secs: u64,
}

pub fn spawn(deps: StatsLoggerDeps, config: StatsLoggerConfig) -> tokio::task::JoinHandle<()> {
    let StatsLoggerDeps {
        stores,
        mut status_rx,
        invalidations,
        mut shutdown_rx,
    } = deps;
    let stats_log_interval = Duration::from_secs(config.stats_log_interval_secs);

    tokio::spawn(async move {
        let mut stats_log_tick = interval(stats_log_interval);
        stats_log_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut watching_status = true;

        loop {
            tokio::select! {
                _ = stats_log_tick.tick() => {
                    let connection = *status_rx.borrow();
                    let stats = collect_stats(&stores, connection, &invalidations);
                    tracing::info!(
                        connection = %stats.connection,
                        traces = stats.traces,
                        traffic_agents = stats.traffic_agents,
                        online_agents = stats.online_agents,
                        invalidation_listeners = stats.invalidation_listeners,
                        "app stats"
                    );
                }
                changed = status_rx.changed(), if watching_status => {
                    if changed.is_err() {
                        // Transport task finished; keep logging counters only.
                        watching_status = false;
                        continue;
                    }
                    let status = *status_rx.borrow_and_update();
                    if status == ConnectionStatus::Disconnected {
                        tracing::warn!("stream transport gave up; live data will go stale");
                    } else {
                        tracing::debug!(connection = %status, "connection status changed");
                    }
                }
                _ = &mut shutdown_rx => {
                    tracing::debug!("Stats logger shutting down");
                    break;
                }
            }
        }
    })
}

use anyhow::Result;
use pathwatch::*;
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = config::AppConfig::load()?;
    tracing::info!(
        name = version::NAME,
        version = version::VERSION,
        stream = %app_config.stream.url,
        "starting"
    );

    let stores = stores::LiveStores::new(&app_config.store);
    let (invalidation_tx, _) =
        broadcast::channel::<dispatch::Invalidation>(app_config.publishing.invalidation_capacity);
    let dispatcher = dispatch::Dispatcher::new(stores.clone(), invalidation_tx.clone());

    let (live, live_task) = transport::spawn(
        dispatcher,
        transport::TransportConfig::from(&app_config.stream),
    );

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let stats_handle = worker::spawn(
        worker::StatsLoggerDeps {
            stores: stores.clone(),
            status_rx: live.status_receiver(),
            invalidations: invalidation_tx.clone(),
            shutdown_rx,
        },
        worker::StatsLoggerConfig {
            stats_log_interval_secs: app_config.monitoring.stats_log_interval_secs,
        },
    );

    let app = routes::app(stores, live.status_receiver(), invalidation_tx);
    let addr = format!("{}:{}", app_config.server.host, app_config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);

    tokio::select! {
        result = axum::serve(listener, app) => {
            result?;
        }
        _ = async {
            #[cfg(unix)]
            {
                let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                    Ok(s) => s,
                    Err(_) => {
                        let _ = tokio::signal::ctrl_c().await;
                        return;
                    }
                };
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            #[cfg(not(unix))]
            {
                let _ = tokio::signal::ctrl_c().await;
            }
        } => {
            tracing::info!("Received shutdown signal");
        }
    }

    live.shutdown();
    let _ = live_task.await;
    let _ = shutdown_tx.send(());
    let _ = stats_handle.await;

    Ok(())
}

// Local read-only HTTP + WebSocket surface for the presentation layer

mod http;
mod ws;

use axum::{Router, routing::get};
use tokio::sync::{broadcast, watch};
use tower_http::cors::{Any, CorsLayer};

use crate::dispatch::Invalidation;
use crate::stores::LiveStores;
use crate::transport::ConnectionStatus;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) stores: LiveStores,
    pub(crate) status: watch::Receiver<ConnectionStatus>,
    pub(crate) invalidations: broadcast::Sender<Invalidation>,
}

pub fn app(
    stores: LiveStores,
    status: watch::Receiver<ConnectionStatus>,
    invalidations: broadcast::Sender<Invalidation>,
) -> Router {
    let state = AppState {
        stores,
        status,
        invalidations,
    };
    Router::new()
        .route("/", get(|| async { "pathwatch live client" })) // GET /
        .route("/version", get(http::version_handler)) // GET /version
        .route("/api/status", get(http::status_handler)) // GET /api/status
        .route("/api/traces", get(http::trace_keys_handler)) // GET /api/traces
        .route(
            "/api/traces/{agent_id}/{target_id}",
            get(http::trace_snapshot_handler),
        )
        .route(
            "/api/traces/{agent_id}/{target_id}/hops",
            get(http::hops_handler),
        )
        .route(
            "/api/traces/{agent_id}/{target_id}/rounds",
            get(http::round_count_handler),
        )
        .route(
            "/api/traces/{agent_id}/{target_id}/series/{metric}",
            get(http::time_series_handler),
        )
        .route(
            "/api/agents/{agent_id}/online",
            get(http::agent_online_handler),
        )
        .route(
            "/api/traffic/{agent_id}/processes",
            get(http::processes_handler),
        )
        .route(
            "/api/traffic/{agent_id}/history/{process_name}",
            get(http::process_history_handler),
        )
        .route("/ws/invalidations", get(ws::ws_invalidations)) // WS /ws/invalidations
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}

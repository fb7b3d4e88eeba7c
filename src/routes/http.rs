// GET handlers: read projections only, never mutate the stores

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use super::AppState;
use crate::models::{HopSnapshot, Metric, TimeSeries, TraceSnapshot, TrafficHistoryEntry};
use crate::version::{NAME, VERSION};
use crate::worker::collect_stats;

/// GET /version: returns client name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": NAME,
        "version": VERSION,
    }))
}

/// GET /api/status: connection status and store counters.
pub(super) async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let connection = *state.status.borrow();
    let stats = collect_stats(&state.stores, connection, &state.invalidations);
    Json(stats)
}

pub(super) async fn trace_keys_handler(State(state): State<AppState>) -> impl IntoResponse {
    let keys = state.stores.traces().trace_keys();
    Json(keys)
}

/// GET /api/traces/{agent}/{target}: consistent versioned snapshot; 404 until a round arrives.
pub(super) async fn trace_snapshot_handler(
    State(state): State<AppState>,
    Path((agent_id, target_id)): Path<(String, String)>,
) -> Result<Json<TraceSnapshot>, StatusCode> {
    let snapshot = state.stores.traces().snapshot(&agent_id, &target_id);
    snapshot.map(Json).ok_or(StatusCode::NOT_FOUND)
}

pub(super) async fn hops_handler(
    State(state): State<AppState>,
    Path((agent_id, target_id)): Path<(String, String)>,
) -> Result<Json<Vec<HopSnapshot>>, StatusCode> {
    let hops = state.stores.traces().hops(&agent_id, &target_id);
    hops.map(Json).ok_or(StatusCode::NOT_FOUND)
}

/// GET .../rounds: the cheap change detector; poll this, fetch series only when it moves.
pub(super) async fn round_count_handler(
    State(state): State<AppState>,
    Path((agent_id, target_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, StatusCode> {
    let rounds = state
        .stores
        .traces()
        .round_count(&agent_id, &target_id)
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(serde_json::json!({ "roundCount": rounds })))
}

pub(super) async fn time_series_handler(
    State(state): State<AppState>,
    Path((agent_id, target_id, metric)): Path<(String, String, String)>,
) -> Result<Json<TimeSeries>, StatusCode> {
    let metric: Metric = metric.parse().map_err(|_| StatusCode::BAD_REQUEST)?;
    let series = state
        .stores
        .traces()
        .time_series(&agent_id, &target_id, metric);
    series.map(Json).ok_or(StatusCode::NOT_FOUND)
}

pub(super) async fn agent_online_handler(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
) -> impl IntoResponse {
    let is_online = state.stores.agents().is_online(&agent_id);
    Json(serde_json::json!({ "agentId": agent_id, "isOnline": is_online }))
}

/// GET /api/traffic/{agent}/processes: latest per-process summaries; empty when unknown.
pub(super) async fn processes_handler(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
) -> impl IntoResponse {
    let processes = state.stores.traffic().processes(&agent_id);
    Json(processes)
}

pub(super) async fn process_history_handler(
    State(state): State<AppState>,
    Path((agent_id, process_name)): Path<(String, String)>,
) -> Json<Vec<TrafficHistoryEntry>> {
    let history = state
        .stores
        .traffic()
        .process_history(&agent_id, &process_name);
    Json(history)
}

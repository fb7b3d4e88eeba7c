// Per-process traffic payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionProtocol {
    Tcp,
    Udp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteEndpoint {
    pub remote_addr: String,
    pub remote_port: u16,
    pub protocol: ConnectionProtocol,
    pub bytes_in_per_sec: f64,
    pub bytes_out_per_sec: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessTrafficSummary {
    pub pid: u32,
    pub process_name: String,
    #[serde(default)]
    pub exe_path: Option<String>,
    pub bytes_in_per_sec: f64,
    pub bytes_out_per_sec: f64,
    pub active_connections: u32,
    #[serde(default)]
    pub top_remote_endpoints: Vec<RemoteEndpoint>,
}

/// Full traffic snapshot for one agent, rates already computed upstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveProcessTrafficUpdate {
    pub agent_id: String,
    pub captured_at: DateTime<Utc>,
    pub processes: Vec<ProcessTrafficSummary>,
}

/// One sparkline point in a process's bandwidth history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrafficHistoryEntry {
    /// Epoch seconds.
    pub timestamp: f64,
    pub bytes_in_per_sec: f64,
    pub bytes_out_per_sec: f64,
}

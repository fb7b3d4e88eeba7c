// Notification payloads that only invalidate remote caches

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertFiredNotification {
    pub alert_event_id: String,
    pub rule_name: String,
    #[serde(default)]
    pub target_address: String,
    #[serde(default)]
    pub hop_number: Option<u8>,
    #[serde(default)]
    pub metric: String,
    #[serde(default)]
    pub value: f64,
    #[serde(default)]
    pub threshold: f64,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentStatusChange {
    pub agent_id: String,
    #[serde(default)]
    pub agent_name: String,
    pub is_online: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteChangeNotification {
    pub target_id: String,
    pub session_id: String,
    #[serde(default)]
    pub detected_at: Option<DateTime<Utc>>,
    pub hops_changed: u8,
    #[serde(default)]
    pub old_hop_count: u8,
    #[serde(default)]
    pub new_hop_count: u8,
}

/// Agent self-update phase; serializes to snake_case (e.g. "downloading").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateStatus {
    Downloading,
    Verifying,
    Installing,
    Restarting,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateProgressReport {
    pub agent_id: String,
    pub status: UpdateStatus,
    pub progress_pct: u8,
    #[serde(default)]
    pub error: Option<String>,
}

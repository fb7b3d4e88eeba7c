// Stream envelopes: inbound events from the server, outbound subscription control

use serde::{Deserialize, Serialize};

use crate::models::{
    AgentStatusChange, AlertFiredNotification, LiveProcessTrafficUpdate, LiveTraceUpdate,
    RouteChangeNotification, UpdateProgressReport,
};

/// Inbound frame: `{"type": "<kind>", "data": {...}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    LiveTrace(LiveTraceUpdate),
    AgentStatus(AgentStatusChange),
    AlertFired(AlertFiredNotification),
    RouteChange(RouteChangeNotification),
    UpdateStatus(UpdateProgressReport),
    ProcessTraffic(LiveProcessTrafficUpdate),
}

impl ServerMessage {
    pub fn decode(frame: &str) -> serde_json::Result<Self> {
        serde_json::from_str(frame)
    }

    pub fn kind(&self) -> EventKind {
        match self {
            ServerMessage::LiveTrace(_) => EventKind::LiveTrace,
            ServerMessage::AgentStatus(_) => EventKind::AgentStatus,
            ServerMessage::AlertFired(_) => EventKind::AlertFired,
            ServerMessage::RouteChange(_) => EventKind::RouteChange,
            ServerMessage::UpdateStatus(_) => EventKind::UpdateStatus,
            ServerMessage::ProcessTraffic(_) => EventKind::ProcessTraffic,
        }
    }
}

/// Payload-free discriminant of [`ServerMessage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    LiveTrace,
    AgentStatus,
    AlertFired,
    RouteChange,
    UpdateStatus,
    ProcessTraffic,
}

/// Outbound control frame. Variant names are the wire tags (`"Subscribe"`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ClientMessage {
    Subscribe { target_ids: Vec<String> },
    Unsubscribe { target_ids: Vec<String> },
    SubscribeTraffic { agent_ids: Vec<String> },
    UnsubscribeTraffic { agent_ids: Vec<String> },
}

impl ClientMessage {
    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

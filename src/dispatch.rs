// Routes decoded stream events to their store, or to an invalidation signal

use serde::Serialize;
use tokio::sync::broadcast;

use crate::protocol::{EventKind, ServerMessage};
use crate::stores::LiveStores;

/// Signal that data held outside this client (request/response caches) went stale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Invalidation {
    /// Agent list or agent detail (online flag, version, update progress).
    Agents,
    AlertEvents,
    Routes { target_id: String },
}

/// Holds only handles: the stores it writes to and the invalidation channel.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    stores: LiveStores,
    invalidations: broadcast::Sender<Invalidation>,
}

impl Dispatcher {
    pub fn new(stores: LiveStores, invalidations: broadcast::Sender<Invalidation>) -> Self {
        Self {
            stores,
            invalidations,
        }
    }

    pub fn stores(&self) -> &LiveStores {
        &self.stores
    }

    /// Decodes one text frame and applies it. Malformed or unknown frames are dropped
    /// without touching any store; the routed kind is returned otherwise.
    pub fn dispatch(&self, frame: &str) -> Option<EventKind> {
        match ServerMessage::decode(frame) {
            Ok(msg) => {
                let kind = msg.kind();
                self.apply(msg);
                Some(kind)
            }
            Err(e) => {
                tracing::debug!(error = %e, operation = "decode_frame", "dropping malformed frame");
                None
            }
        }
    }

    pub fn apply(&self, msg: ServerMessage) {
        match msg {
            ServerMessage::LiveTrace(update) => {
                self.stores.traces_mut().push_round(
                    &update.agent_id,
                    &update.target_id,
                    update.sent_at,
                    &update.hops,
                );
            }
            ServerMessage::AgentStatus(status) => {
                self.stores
                    .agents_mut()
                    .set_online(&status.agent_id, status.is_online);
                self.invalidate(Invalidation::Agents);
            }
            ServerMessage::ProcessTraffic(update) => {
                self.stores.traffic_mut().push_traffic(update);
            }
            ServerMessage::AlertFired(alert) => {
                tracing::debug!(rule = %alert.rule_name, "alert fired");
                self.invalidate(Invalidation::AlertEvents);
            }
            ServerMessage::RouteChange(change) => {
                tracing::debug!(
                    target_id = %change.target_id,
                    hops_changed = change.hops_changed,
                    "route change"
                );
                self.invalidate(Invalidation::Routes {
                    target_id: change.target_id,
                });
            }
            ServerMessage::UpdateStatus(_) => {
                self.invalidate(Invalidation::Agents);
            }
        }
    }

    fn invalidate(&self, signal: Invalidation) {
        // No receivers just means nobody is listening right now.
        let _ = self.invalidations.send(signal);
    }
}

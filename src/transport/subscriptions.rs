// Logical subscription set; outlives any single connection and is replayed whole on connect

use std::collections::BTreeSet;

use crate::protocol::ClientMessage;

/// Plain sets, no per-id reference counting: removing an id drops it for every consumer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionSet {
    targets: BTreeSet<String>,
    agents: BTreeSet<String>,
}

impl SubscriptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_targets<S: AsRef<str>>(&mut self, ids: &[S]) {
        self.targets
            .extend(ids.iter().map(|id| id.as_ref().to_string()));
    }

    pub fn remove_targets<S: AsRef<str>>(&mut self, ids: &[S]) {
        for id in ids {
            self.targets.remove(id.as_ref());
        }
    }

    pub fn add_agents<S: AsRef<str>>(&mut self, ids: &[S]) {
        self.agents
            .extend(ids.iter().map(|id| id.as_ref().to_string()));
    }

    pub fn remove_agents<S: AsRef<str>>(&mut self, ids: &[S]) {
        for id in ids {
            self.agents.remove(id.as_ref());
        }
    }

    pub fn targets(&self) -> Vec<String> {
        self.targets.iter().cloned().collect()
    }

    pub fn agents(&self) -> Vec<String> {
        self.agents.iter().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty() && self.agents.is_empty()
    }

    /// Frames to send right after a connection opens: one `Subscribe` with every target,
    /// then one `SubscribeTraffic` with every agent, each only when non-empty.
    pub fn replay_messages(&self) -> Vec<ClientMessage> {
        let mut out = Vec::with_capacity(2);
        if !self.targets.is_empty() {
            out.push(ClientMessage::Subscribe {
                target_ids: self.targets(),
            });
        }
        if !self.agents.is_empty() {
            out.push(ClientMessage::SubscribeTraffic {
                agent_ids: self.agents(),
            });
        }
        out
    }
}

// Agent online/offline flags as last reported by the stream

use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct AgentStatusStore {
    online: HashMap<String, bool>,
}

impl AgentStatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_online(&mut self, agent_id: &str, is_online: bool) {
        self.online.insert(agent_id.to_string(), is_online);
    }

    /// `None` until the stream has reported on this agent.
    pub fn is_online(&self, agent_id: &str) -> Option<bool> {
        self.online.get(agent_id).copied()
    }

    pub fn online_agents(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .online
            .iter()
            .filter(|(_, online)| **online)
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }
}
